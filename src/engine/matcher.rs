use rand::Rng;

pub const SUCCESS_MESSAGES: &[&str] = &[
    "Correct! Another stamp for your passport.",
    "Well spotted! The artwork gives up its secret.",
    "Exactly right. Onward to the next room!",
    "Bravo! You have a curator's eye.",
    "That's it! The museum is proud of you.",
];

pub const INCORRECT_MESSAGES: &[&str] = &[
    "Not quite. Take another look at the artwork.",
    "Hmm, that's not it. Try again!",
    "Close, but the riddle wants something else.",
    "The guide shakes their head. One more try?",
    "Not this time. A hint might help.",
];

/// Picks an index into a message pool. `len` is never zero.
pub trait MessagePicker {
    fn pick(&self, len: usize) -> usize;
}

impl<F: Fn(usize) -> usize> MessagePicker for F {
    fn pick(&self, len: usize) -> usize {
        self(len)
    }
}

/// Uniform choice from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl MessagePicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

pub fn choose<'a>(picker: &dyn MessagePicker, pool: &[&'a str]) -> &'a str {
    // Out-of-range picks from a test stub wrap instead of panicking
    pool[picker.pick(pool.len()) % pool.len()]
}

/// Trims and lowercases. No diacritic folding.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// True when either normalized text contains the other. Blank submissions
/// are turned away before matching and blank candidates at route load.
pub fn is_match(submission: &str, candidate: &str) -> bool {
    let submission = normalize(submission);
    let candidate = normalize(candidate);
    submission == candidate || submission.contains(&candidate) || candidate.contains(&submission)
}

pub fn matches_any<'a>(submission: &str, mut candidates: impl Iterator<Item = &'a str>) -> bool {
    candidates.any(|c| is_match(submission, c))
}
