//! Limits applied while opening an archive

use bon::Builder;

/// Options for how an [`crate::Archive`] is opened
///
/// ```
/// use szs_vfs::OpenOptions;
///
/// let options = OpenOptions::builder()
///     .max_wrapper_depth(1)
///     .max_decompressed_len(64 * 1024 * 1024)
///     .build();
/// assert_eq!(options.max_wrapper_depth, 1);
/// assert_eq!(OpenOptions::default().max_wrapper_depth, 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct OpenOptions {
    /// How many Yaz0 layers may be wrapped around the archive
    #[builder(default = 4)]
    pub max_wrapper_depth: usize,

    /// Largest decompressed size a Yaz0 layer may declare, in bytes
    #[builder(default = 256 * 1024 * 1024)]
    pub max_decompressed_len: u64,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions::builder().build()
    }
}
