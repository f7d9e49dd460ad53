mod gstreamer_source;
mod pipeline_builder;

pub use gstreamer_source::{GStreamerDecoder, GStreamerSourceOpener};
pub use pipeline_builder::PipelineBuilder;
