use tcmbus_core::Driver;
use tcmbus_core::config::Config;
use tcmbus_core::core::{Hart, ScriptedHart};
use tcmbus_core::sim::loader::ImageLoader;
use tracing_subscriber::EnvFilter;

/// Base of the default instruction TCM.
pub const ITCM_BASE: u64 = 0x0000_0000;
/// Base of the default data TCM.
pub const DTCM_BASE: u64 = 0x0010_0000;
/// Size of each default TCM bank.
pub const TCM_SIZE: u64 = 0x8_0000;
/// Base of the default CSR block.
pub const CSR_BASE: u64 = 0x0020_0000;

/// Installs a test-writer subscriber once per process. Honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// Default memory map with a custom bus geometry.
pub fn geometry(bus_width: u64, max_burst_beats: u64, burst_boundary: u64) -> Config {
    let mut config = Config::default();
    config.system.bus_width = bus_width;
    config.system.max_burst_beats = max_burst_beats;
    config.system.burst_boundary = burst_boundary;
    config
}

pub struct TestContext<H = ScriptedHart> {
    pub driver: Driver<H>,
}

impl Default for TestContext<ScriptedHart> {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext<ScriptedHart> {
    /// Default configuration with a core that never halts.
    pub fn new() -> Self {
        Self::with_hart(Config::default(), ScriptedHart::new())
    }

    /// Custom configuration with a core that never halts.
    pub fn with_config(config: Config) -> Self {
        Self::with_hart(config, ScriptedHart::new())
    }
}

impl<H: Hart> TestContext<H> {
    pub fn with_hart(config: Config, hart: H) -> Self {
        init_tracing();
        Self {
            driver: Driver::new(config, hart).unwrap(),
        }
    }

    /// Takes the device out of reset by loading an empty image at the ITCM base.
    pub fn loaded(self) -> Self {
        self.loaded_at(ITCM_BASE)
    }

    pub fn loaded_at(mut self, entry_point: u64) -> Self {
        let _ = ImageLoader::load(&mut self.driver, entry_point, &[]).unwrap();
        self
    }

    /// Loads, releases the core and returns the context.
    pub fn running(mut self) -> Self {
        self = self.loaded();
        self.driver.run().unwrap();
        self
    }
}

/// `len` bytes of a simple deterministic pattern, offset by `seed`.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}
