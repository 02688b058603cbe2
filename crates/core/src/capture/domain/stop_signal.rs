/// Polled once per frame before capture; `true` ends the session.
pub trait StopSignal: Send {
    fn should_stop(&mut self) -> bool;
}
