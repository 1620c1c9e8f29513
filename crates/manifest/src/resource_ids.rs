//! Well-known `android:` attribute resource ids.
//!
//! The manifest editor and parser look these fields up by resource id
//! first (falling back to the namespaced attribute name), matching the
//! data model's requirement that known fields "must be read/written by
//! resource id, not by attribute name alone." Values mirror the public
//! Android attribute ids (`frameworks/base/core/res/res/values/public.xml`).

pub const VERSION_CODE: u32 = 0x0101021b;
pub const VERSION_NAME: u32 = 0x0101021c;
pub const MIN_SDK_VERSION: u32 = 0x0101020c;
pub const TARGET_SDK_VERSION: u32 = 0x01010270;
pub const MAX_SDK_VERSION: u32 = 0x01010271;
pub const NAME: u32 = 0x01010003;
pub const VALUE: u32 = 0x01010024;
pub const RESOURCE: u32 = 0x010100ba;
pub const LABEL: u32 = 0x01010001;
pub const ICON: u32 = 0x01010002;
pub const ROUND_ICON: u32 = 0x01010991;
pub const ALLOW_BACKUP: u32 = 0x01010280;
pub const HAS_CODE: u32 = 0x0101000c;
pub const EXTRACT_NATIVE_LIBS: u32 = 0x010104ea;
pub const IS_SPLIT_REQUIRED: u32 = 0x01010591;
pub const TARGET_SANDBOX_VERSION: u32 = 0x0101054c;
pub const EXPORTED: u32 = 0x01010010;
pub const SPLIT_NAME: u32 = 0x01010a5c;

/// `package`, `split` and `configForSplit` have no well-known resource
/// id in the public attribute list; they are read/written purely by
/// local name on the `<manifest>` element.
pub const PACKAGE_ATTR: &str = "package";
pub const SPLIT_ATTR: &str = "split";
pub const CONFIG_FOR_SPLIT_ATTR: &str = "configForSplit";
pub const ANDROID_NS: &str = "android";
pub const DIST_NS: &str = "dist";
