mod jpeg_codec;

pub use jpeg_codec::JpegCodec;
