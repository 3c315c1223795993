/// Spoken feedback for command replies.
pub trait Speaker: Send + Sync {
    fn speak(&self, text: &str);
}

/// Stands in for a speech engine by echoing to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSpeaker;

impl Speaker for ConsoleSpeaker {
    fn speak(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        println!("[TTS] {text}");
    }
}
