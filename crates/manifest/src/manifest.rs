//! The [`Manifest`] value type and the module-delivery resolution state
//! machine.

use crate::resource_ids as rid;
use crate::tree::{AttributeValue, XmlNode};

/// A parsed module manifest: a proto-XML tree rooted at `<manifest>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub root: XmlNode,
}

impl Manifest {
    pub fn new(root: XmlNode) -> Self {
        Manifest { root }
    }

    pub fn package(&self) -> Option<&str> {
        self.root
            .attr_by_id_or_name(None, None, rid::PACKAGE_ATTR)
            .and_then(|a| a.value.as_str())
    }

    pub fn split_name(&self) -> Option<&str> {
        self.root
            .attr_by_id_or_name(None, None, rid::SPLIT_ATTR)
            .and_then(|a| a.value.as_str())
    }

    pub fn version_code(&self) -> Option<i64> {
        self.root
            .attr_by_id_or_name(Some(rid::VERSION_CODE), Some(rid::ANDROID_NS), "versionCode")
            .and_then(|a| a.value.as_int())
    }

    fn uses_sdk(&self) -> Option<&XmlNode> {
        self.root.find_child("uses-sdk")
    }

    pub fn min_sdk_version(&self) -> Option<i64> {
        self.uses_sdk()?
            .attr_by_id_or_name(Some(rid::MIN_SDK_VERSION), Some(rid::ANDROID_NS), "minSdkVersion")
            .and_then(|a| a.value.as_int())
    }

    fn application(&self) -> Option<&XmlNode> {
        self.root.find_child("application")
    }

    /// Legacy `onDemand="true"` attribute some older manifests carry
    /// directly on `<module>`/`<dist:module>`, predating `<delivery>`.
    fn legacy_on_demand(&self) -> bool {
        self.root
            .find_child("module")
            .or_else(|| self.root.find_child("dist:module"))
            .and_then(|m| m.attr_by_id_or_name(None, Some(rid::DIST_NS), "onDemand"))
            .and_then(|a| a.value.as_bool())
            .unwrap_or(false)
    }

    fn delivery_element(&self) -> Option<&XmlNode> {
        self.root
            .find_child("module")
            .or_else(|| self.root.find_child("dist:module"))
            .and_then(|m| m.find_child("delivery").or_else(|| m.find_child("dist:delivery")))
    }

    /// Resolve this module's delivery from its `<dist:delivery>` (or
    /// legacy `onDemand`) declaration.
    pub fn resolve_delivery(&self) -> ModuleDelivery {
        if let Some(delivery) = self.delivery_element() {
            let install_time = delivery
                .find_child("install-time")
                .or_else(|| delivery.find_child("dist:install-time"));
            return match install_time {
                Some(install_time) => {
                    let has_conditions = install_time
                        .find_child("conditions")
                        .or_else(|| install_time.find_child("dist:conditions"))
                        .is_some();
                    if has_conditions {
                        ModuleDelivery::ConditionalInitialInstall
                    } else {
                        ModuleDelivery::AlwaysInitialInstall
                    }
                }
                None => ModuleDelivery::NoInitialInstall,
            };
        }
        if self.legacy_on_demand() {
            return ModuleDelivery::NoInitialInstall;
        }
        ModuleDelivery::AlwaysInitialInstall
    }

    /// Find the launcher activity: the first `<activity>` under
    /// `<application>` carrying an intent-filter with both
    /// `android.intent.action.MAIN` and `android.intent.category.LAUNCHER`.
    pub fn main_activity(&self) -> Option<&XmlNode> {
        let app = self.application()?;
        app.children.iter().find(|child| {
            child.name == "activity"
                && child.children.iter().any(|filter| {
                    filter.name == "intent-filter"
                        && filter.children.iter().any(|c| {
                            c.name == "action"
                                && c.attr_by_id_or_name(None, Some(rid::ANDROID_NS), "name")
                                    .and_then(|a| a.value.as_str())
                                    == Some("android.intent.action.MAIN")
                        })
                        && filter.children.iter().any(|c| {
                            c.name == "category"
                                && c.attr_by_id_or_name(None, Some(rid::ANDROID_NS), "name")
                                    .and_then(|a| a.value.as_str())
                                    == Some("android.intent.category.LAUNCHER")
                        })
                })
        })
    }
}

/// Result of the module delivery resolution state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleDelivery {
    AlwaysInitialInstall,
    ConditionalInitialInstall,
    NoInitialInstall,
}
