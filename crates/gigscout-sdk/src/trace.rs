/// Logging seam used by every gigscout component.
///
/// Components hold a named `Tracing` source from the host context rather
/// than calling the `tracing` macros directly, so every line is masked and
/// tagged with the component name.
pub trait TraceWriter: Send + Sync {
    fn info(&self, message: &str);

    fn verbose(&self, message: &str);

    fn warning(&self, message: &str) {
        self.info(&format!("[warning] {message}"));
    }

    fn error(&self, message: &str) {
        self.info(&format!("[error] {message}"));
    }
}
