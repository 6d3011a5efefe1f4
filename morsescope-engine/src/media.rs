use flume::{Receiver, Sender};
use morsescope_messages::Hertz;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// PCM blocks buffered between the playback thread and the analyser.
const TAP_QUEUE_BLOCKS: usize = 64;

static NEXT_MEDIA_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to the media the playback engine is currently playing.
///
/// A media element carries a single live-tap slot. The first successful
/// [`MediaElement::claim_tap`] owns it for the lifetime of the element; later
/// claims fail. Loading a new recording creates a new element with a free slot.
#[derive(Debug, Clone)]
pub struct MediaElement {
    inner: Arc<MediaInner>,
}

#[derive(Debug)]
struct MediaInner {
    id: u64,
    sample_rate: Hertz,
    tap: OnceLock<Sender<Vec<f32>>>,
}

/// Ownership of a media element's live tap. Receives the PCM the element plays.
#[derive(Debug)]
pub struct TapToken {
    media_id: u64,
    sample_rate: Hertz,
    rx: Receiver<Vec<f32>>,
}

impl MediaElement {
    pub fn new(sample_rate: Hertz) -> Self {
        Self {
            inner: Arc::new(MediaInner {
                id: NEXT_MEDIA_ID.fetch_add(1, Ordering::Relaxed),
                sample_rate,
                tap: OnceLock::new(),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn sample_rate(&self) -> Hertz {
        self.inner.sample_rate
    }

    /// Attach the live tap. `None` if it was already attached, by anyone.
    pub fn claim_tap(&self) -> Option<TapToken> {
        let (tx, rx) = flume::bounded(TAP_QUEUE_BLOCKS);
        self.inner.tap.set(tx).ok()?;
        Some(TapToken {
            media_id: self.inner.id,
            sample_rate: self.inner.sample_rate,
            rx,
        })
    }

    pub fn is_tapped(&self) -> bool {
        self.inner.tap.get().is_some()
    }

    /// Hand a block of played samples to the tap, if attached.
    ///
    /// Never blocks: blocks are dropped when the analyser falls behind or the
    /// token is gone.
    pub fn feed(&self, block: &[f32]) {
        if let Some(tx) = self.inner.tap.get() {
            let _ = tx.try_send(block.to_vec());
        }
    }
}

impl TapToken {
    pub fn media_id(&self) -> u64 {
        self.media_id
    }

    pub fn sample_rate(&self) -> Hertz {
        self.sample_rate
    }

    /// Blocks fed since the last call, oldest first.
    pub fn drain(&self) -> impl Iterator<Item = Vec<f32>> + '_ {
        self.rx.try_iter()
    }
}
