/// Configuration for batch analysis.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Larger collections are subsampled down to this many items
    pub max_samples: usize,

    /// Analyze items on the rayon pool instead of one by one
    pub parallel: bool,

    /// Fixed seed for subsampling; `None` draws from OS entropy
    pub seed: Option<u64>,
}

pub const DEFAULT_MAX_SAMPLES: usize = 100;

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_samples: DEFAULT_MAX_SAMPLES,
            parallel: false,
            seed: None,
        }
    }
}
