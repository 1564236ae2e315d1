/// Route the page moves to once an offer has been accepted and fulfilment starts.
pub const TRANSIT_ROUTE: &str = "/transit";

/// One-shot redirect mechanism owned by whoever hosts the page view.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}
