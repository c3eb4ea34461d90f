//! Deterministic tokenizer and loader used by unit tests

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc, Arc, Mutex,
    },
    thread,
    time::Duration,
};

use super::{
    error::{LoadCause, TokenizerError},
    factory::TokenizerLoader,
    traits::{BoundaryMarkers, Encoding, TokenIdType, Tokenizer},
};

const VOCAB: &[&str] = &[
    "[CLS]", "[SEP]", "[UNK]", "hello", "world", "the", "quick", "brown", "fox",
];
const CLS: TokenIdType = 0;
const SEP: TokenIdType = 1;
const UNK: TokenIdType = 2;

/// Text that makes [`MockTokenizer::encode`] fail
pub(crate) const FAILING_TEXT: &str = "boom";
/// Word that encodes to an id outside the vocabulary
pub(crate) const GHOST_WORD: &str = "ghost";

/// Splits on whitespace, one token per word, with character offsets
pub(crate) struct MockTokenizer {
    boundary_markers: BoundaryMarkers,
}

impl MockTokenizer {
    pub(crate) fn new(boundary_markers: BoundaryMarkers) -> Self {
        Self { boundary_markers }
    }
}

pub(crate) fn split_words(text: &str) -> Vec<(&str, usize, usize)> {
    let mut words = Vec::new();
    let mut start: Option<(usize, usize)> = None;
    let mut char_pos = 0;
    for (byte, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some((b, c)) = start.take() {
                words.push((&text[b..byte], c, char_pos));
            }
        } else if start.is_none() {
            start = Some((byte, char_pos));
        }
        char_pos += 1;
    }
    if let Some((b, c)) = start {
        words.push((&text[b..], c, char_pos));
    }
    words
}

impl Tokenizer for MockTokenizer {
    fn encode(&self, text: &str) -> Result<Encoding, TokenizerError> {
        if text == FAILING_TEXT {
            return Err(TokenizerError::Encode("mock failure".to_string()));
        }

        let mut ids = Vec::new();
        let mut offsets = Vec::new();
        let wrapped = self.boundary_markers == BoundaryMarkers::Wrapped;
        if wrapped {
            ids.push(CLS);
            offsets.push((0, 0));
        }
        for (word, start, end) in split_words(text) {
            let id = if word == GHOST_WORD {
                999
            } else {
                VOCAB
                    .iter()
                    .position(|v| *v == word)
                    .map(|p| p as TokenIdType)
                    .unwrap_or(UNK)
            };
            ids.push(id);
            offsets.push((start, end));
        }
        if wrapped {
            ids.push(SEP);
            offsets.push((0, 0));
        }
        Encoding::new(ids, offsets)
    }

    fn id_to_token(&self, id: TokenIdType) -> Option<String> {
        VOCAB.get(id as usize).map(|t| t.to_string())
    }

    fn vocab_size(&self) -> usize {
        VOCAB.len()
    }

    fn boundary_markers(&self) -> BoundaryMarkers {
        self.boundary_markers
    }
}

/// Loader that counts invocations and can be told to fail, stall, or panic
#[derive(Default)]
pub(crate) struct MockLoader {
    loads: AtomicUsize,
    failing: Vec<String>,
    delay: Option<Duration>,
    gate: Option<(String, Mutex<mpsc::Receiver<()>>)>,
    panic_on: Option<String>,
    boundary_markers: BoundaryMarkers,
    credentials: Mutex<Vec<Option<String>>>,
}

impl MockLoader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_for(mut self, model_id: &str) -> Self {
        self.failing.push(model_id.to_string());
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Loads of `model_id` block until the returned sender fires
    pub(crate) fn gated_on(mut self, model_id: &str) -> (Self, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        self.gate = Some((model_id.to_string(), Mutex::new(rx)));
        (self, tx)
    }

    pub(crate) fn panicking_for(mut self, model_id: &str) -> Self {
        self.panic_on = Some(model_id.to_string());
        self
    }

    pub(crate) fn with_boundary_markers(mut self, boundary_markers: BoundaryMarkers) -> Self {
        self.boundary_markers = boundary_markers;
        self
    }

    pub(crate) fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub(crate) fn credentials_seen(&self) -> Vec<Option<String>> {
        self.credentials.lock().unwrap().clone()
    }
}

impl TokenizerLoader for MockLoader {
    fn load(
        &self,
        model_id: &str,
        credential: Option<&str>,
    ) -> Result<Arc<dyn Tokenizer>, LoadCause> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.credentials
            .lock()
            .unwrap()
            .push(credential.map(str::to_string));

        if let Some((gated, rx)) = &self.gate {
            if gated == model_id {
                let _ = rx.lock().unwrap().recv();
            }
        }
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        if self.panic_on.as_deref() == Some(model_id) {
            panic!("mock loader panic for {}", model_id);
        }
        if self.failing.iter().any(|f| f == model_id) {
            return Err(LoadCause::NotFound(model_id.to_string()));
        }
        Ok(Arc::new(MockTokenizer::new(self.boundary_markers)))
    }
}
