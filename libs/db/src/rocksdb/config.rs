//! Configuration for the RocksDB cell store.

use serde::{Deserialize, Serialize};

// ============================================================================
// StoreConfig
// ============================================================================

/// Block cache and table options for the `cells` column family.
///
/// RocksDB's block cache stores uncompressed data blocks. Cell keys share
/// long prefixes (row, then family), so prefix compression inside a block is
/// effective and the default 4KB block holds many cells.
///
/// See [RocksDB Block Cache Wiki](https://github.com/facebook/rocksdb/wiki/Block-Cache)
/// for detailed documentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Total block cache size in bytes.
    /// Default: 256MB.
    pub cache_size_bytes: usize,

    /// Block size for the cells column family.
    /// Default: 4KB.
    pub block_size: usize,

    /// Whether to cache index and filter blocks in the block cache.
    /// Default: true.
    pub cache_index_and_filter_blocks: bool,

    /// Whether to pin L0 filter and index blocks in cache.
    /// Default: true.
    pub pin_l0_filter_and_index: bool,

    /// Bloom filter bits per key; 0 disables the filter.
    /// Default: 10.
    pub bloom_bits_per_key: f64,

    /// Memtable size before a flush, in bytes.
    /// Default: 64MB.
    pub write_buffer_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_size_bytes: 256 * 1024 * 1024, // 256MB
            block_size: 4 * 1024,                // 4KB
            cache_index_and_filter_blocks: true,
            pin_l0_filter_and_index: true,
            bloom_bits_per_key: 10.0,
            write_buffer_size: 64 * 1024 * 1024, // 64MB
        }
    }
}

impl StoreConfig {
    /// Create config with specified cache size, using defaults for other settings.
    pub fn with_cache_size(cache_size_bytes: usize) -> Self {
        Self {
            cache_size_bytes,
            ..Default::default()
        }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_bloom_bits_per_key(mut self, bits: f64) -> Self {
        self.bloom_bits_per_key = bits;
        self
    }

    /// Options for the cells column family sharing `cache`.
    pub(crate) fn cf_options(&self, cache: &rocksdb::Cache) -> rocksdb::Options {
        let mut opts = rocksdb::Options::default();
        let mut block_opts = rocksdb::BlockBasedOptions::default();

        block_opts.set_block_cache(cache);
        block_opts.set_block_size(self.block_size);
        if self.cache_index_and_filter_blocks {
            block_opts.set_cache_index_and_filter_blocks(true);
        }
        if self.pin_l0_filter_and_index {
            block_opts.set_pin_l0_filter_and_index_blocks_in_cache(true);
        }
        if self.bloom_bits_per_key > 0.0 {
            block_opts.set_bloom_filter(self.bloom_bits_per_key, false);
        }

        opts.set_block_based_table_factory(&block_opts);
        opts.set_write_buffer_size(self.write_buffer_size);
        opts
    }
}
