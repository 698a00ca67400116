mod source;

pub use source::ByteSource;
