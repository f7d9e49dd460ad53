use crate::domain::value_objects::SourceKind;

pub struct PipelineBuilder;

impl PipelineBuilder {
    /// Name of the element that receives the locator
    pub const SOURCE_NAME: &'static str = "src";
    /// Name of the appsink frames are pulled from
    pub const SINK_NAME: &'static str = "sink";

    /// Convert a source kind to a GStreamer pipeline string.
    ///
    /// The locator is set as a property on the source element afterwards so
    /// paths and URLs never need quoting inside the launch syntax.
    pub fn build_launch_string(kind: SourceKind) -> String {
        format!(
            "{} name={}{} ! videoconvert ! appsink name={}",
            Self::source_for_kind(kind),
            Self::SOURCE_NAME,
            Self::decoder_for_kind(kind),
            Self::SINK_NAME
        )
    }

    /// Property of the source element that takes the locator
    pub fn locator_property(kind: SourceKind) -> &'static str {
        match kind {
            SourceKind::Camera => "uri",
            SourceKind::VideoFile => "location",
        }
    }

    fn source_for_kind(kind: SourceKind) -> &'static str {
        match kind {
            SourceKind::Camera => "uridecodebin",
            SourceKind::VideoFile => "filesrc",
        }
    }

    // uridecodebin already decodes; a plain file needs its own decoder
    fn decoder_for_kind(kind: SourceKind) -> &'static str {
        match kind {
            SourceKind::Camera => "",
            SourceKind::VideoFile => " ! decodebin",
        }
    }
}
