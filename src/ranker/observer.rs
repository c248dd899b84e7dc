use tokio::sync::mpsc;

use crate::listing::Listing;

/// Receives the full ranked collection after every committed change.
pub trait ScoreObserver: Send + Sync {
    fn notify(&self, listings: &[Listing]);
}

impl<F> ScoreObserver for F
where
    F: Fn(&[Listing]) + Send + Sync,
{
    fn notify(&self, listings: &[Listing]) {
        self(listings)
    }
}

/// Forwards every update into an unbounded channel, for a UI loop to drain.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<Vec<Listing>>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Vec<Listing>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ScoreObserver for ChannelObserver {
    fn notify(&self, listings: &[Listing]) {
        // Receiver gone means nobody is listening any more.
        if self.tx.send(listings.to_vec()).is_err() {
            tracing::debug!("update channel closed; dropping notification");
        }
    }
}

/// Logs a one-line summary of each update.
pub struct LogObserver;

impl ScoreObserver for LogObserver {
    fn notify(&self, listings: &[Listing]) {
        let top = listings.first();
        tracing::info!(
            count = listings.len(),
            top_id = top.map(|l| l.id.as_str()).unwrap_or("-"),
            top_score = top.map(|l| l.score).unwrap_or(0),
            "listings updated"
        );
    }
}
