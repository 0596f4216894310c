/// Configuration for the shell's read-eval loop and job table.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Prompt printed before each command line
    pub prompt: String,
    /// Print the prompt at all (driver scripts pass -p to disable it)
    pub emit_prompt: bool,
    /// Maximum number of concurrently tracked jobs
    pub max_jobs: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "jsh> ".to_string(),
            emit_prompt: true,
            max_jobs: 16,
        }
    }
}

impl ShellConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn without_prompt(mut self) -> Self {
        self.emit_prompt = false;
        self
    }

    pub fn with_max_jobs(mut self, max_jobs: usize) -> Self {
        self.max_jobs = max_jobs;
        self
    }
}
