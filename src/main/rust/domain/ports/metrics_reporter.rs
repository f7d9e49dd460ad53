use crate::domain::entities::SessionReport;
use crate::domain::value_objects::SourceKind;

/// Port for metrics reporting
pub trait MetricsReporter: Send + Sync {
    fn report_session_started(&self, kind: SourceKind);
    fn report_session_stopped(&self, report: &SessionReport);
    /// A session died without producing a report
    fn report_session_aborted(&self, kind: SourceKind);
    fn report_frame_sent(&self, bytes: usize);
    fn report_transient_failure(&self);
    fn report_snapshot(&self, kind: SourceKind, succeeded: bool);
}

/// Reporter that drops everything; for tests and tools.
pub struct NoopMetrics;

impl MetricsReporter for NoopMetrics {
    fn report_session_started(&self, _kind: SourceKind) {}
    fn report_session_stopped(&self, _report: &SessionReport) {}
    fn report_session_aborted(&self, _kind: SourceKind) {}
    fn report_frame_sent(&self, _bytes: usize) {}
    fn report_transient_failure(&self) {}
    fn report_snapshot(&self, _kind: SourceKind, _succeeded: bool) {}
}
