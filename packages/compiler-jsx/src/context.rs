use serde::{Deserialize, Serialize};

/// Options for markup compilation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Function called for every element
    pub pragma: String,
    /// Element type used for `<>...</>`
    pub pragma_frag: String,
    /// Name of the exports object the postamble assigns into
    pub exports_name: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            pragma: "React.createElement".to_string(),
            pragma_frag: "React.Fragment".to_string(),
            exports_name: "exports".to_string(),
        }
    }
}

/// Output buffer for one compilation
#[derive(Debug, Default)]
pub(crate) struct CompilerContext {
    buffer: String,
}

impl CompilerContext {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: String::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub fn push(&mut self, c: char) {
        self.buffer.push(c);
    }

    /// Swap in an empty buffer, returning what was written so far
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }

    /// Restore a buffer saved with `take`, returning what was written since
    pub fn restore(&mut self, saved: String) -> String {
        std::mem::replace(&mut self.buffer, saved)
    }

    pub fn into_output(self) -> String {
        self.buffer
    }
}
