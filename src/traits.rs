use crate::errors::ModResult;
use bytes::{Bytes, BytesMut};

pub trait ModParser {
    /// Parse from the front of `data`, advancing it past the consumed bytes
    fn from_bytes(data: &mut Bytes) -> ModResult<Self>
    where
        Self: Sized;
}

pub trait ModWriter {
    fn to_bytes(&self, buffer: &mut BytesMut) -> ModResult<()>;
}
