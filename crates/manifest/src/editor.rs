//! The manifest editor: a value-transformer that produces a new
//! manifest from a sequence of typed mutators. Every mutator here is
//! declarative — calling it twice with the same arguments leaves the tree
//! in the same state it would have reached after one call — except the
//! explicitly additive ones (`add_uses_sdk_library`), which append.

use std::collections::HashSet;

use crate::manifest::Manifest;
use crate::resource_ids as rid;
use crate::tree::{AttributeValue, XmlAttribute, XmlNode};

/// A typed value for `add_meta_data`, mirroring the typed attribute
/// values the proto-XML tree itself carries.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Str(String),
    Int(i64),
    Bool(bool),
    ResourceRef(u32),
}

impl MetadataValue {
    fn into_meta_data_node(self, name: &str) -> XmlNode {
        let mut node = XmlNode::new("meta-data");
        node.set_attr(
            XmlAttribute::new(Some(rid::ANDROID_NS), "name", AttributeValue::Str(name.to_string()))
                .with_resource_id(rid::NAME),
        );
        let value_attr = match self {
            MetadataValue::Str(s) => XmlAttribute::new(Some(rid::ANDROID_NS), "value", AttributeValue::Str(s))
                .with_resource_id(rid::VALUE),
            MetadataValue::Int(i) => XmlAttribute::new(Some(rid::ANDROID_NS), "value", AttributeValue::Int(i))
                .with_resource_id(rid::VALUE),
            MetadataValue::Bool(b) => XmlAttribute::new(Some(rid::ANDROID_NS), "value", AttributeValue::Bool(b))
                .with_resource_id(rid::VALUE),
            MetadataValue::ResourceRef(id) => {
                XmlAttribute::new(Some(rid::ANDROID_NS), "resource", AttributeValue::ResourceRef(id))
                    .with_resource_id(rid::RESOURCE)
            }
        };
        node.set_attr(value_attr);
        node
    }
}

/// The metadata key `set_fused_module_names` writes to, matching the
/// platform's own dynamic-apk fused-module marker.
pub const FUSED_MODULES_METADATA_KEY: &str = "com.android.dynamic.apk.fused.modules";

pub struct ManifestEditor {
    manifest: Manifest,
}

impl ManifestEditor {
    pub fn new(manifest: Manifest) -> Self {
        ManifestEditor { manifest }
    }

    /// Consume the editor, returning the edited manifest. Applying the
    /// same mutator sequence to the result again is a no-op, since every
    /// mutator here is idempotent by construction.
    pub fn save(self) -> Manifest {
        self.manifest
    }

    fn root(&mut self) -> &mut XmlNode {
        &mut self.manifest.root
    }

    fn application(&mut self) -> &mut XmlNode {
        self.root().find_or_create_child("application")
    }

    fn uses_sdk(&mut self) -> &mut XmlNode {
        self.root().find_or_create_child("uses-sdk")
    }

    pub fn set_min_sdk(&mut self, value: i64) -> &mut Self {
        self.uses_sdk().set_attr(
            XmlAttribute::new(Some(rid::ANDROID_NS), "minSdkVersion", AttributeValue::Int(value))
                .with_resource_id(rid::MIN_SDK_VERSION),
        );
        self
    }

    pub fn set_max_sdk(&mut self, value: i64) -> &mut Self {
        self.uses_sdk().set_attr(
            XmlAttribute::new(Some(rid::ANDROID_NS), "maxSdkVersion", AttributeValue::Int(value))
                .with_resource_id(rid::MAX_SDK_VERSION),
        );
        self
    }

    pub fn set_version_code(&mut self, value: i64) -> &mut Self {
        self.root().set_attr(
            XmlAttribute::new(Some(rid::ANDROID_NS), "versionCode", AttributeValue::Int(value))
                .with_resource_id(rid::VERSION_CODE),
        );
        self
    }

    pub fn set_version_name(&mut self, value: impl Into<String>) -> &mut Self {
        self.root().set_attr(
            XmlAttribute::new(Some(rid::ANDROID_NS), "versionName", AttributeValue::Str(value.into()))
                .with_resource_id(rid::VERSION_NAME),
        );
        self
    }

    pub fn set_package(&mut self, value: impl Into<String>) -> &mut Self {
        self.root()
            .set_attr(XmlAttribute::new(None, rid::PACKAGE_ATTR, AttributeValue::Str(value.into())));
        self
    }

    pub fn set_split_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.root()
            .set_attr(XmlAttribute::new(None, rid::SPLIT_ATTR, AttributeValue::Str(id.into())));
        self
    }

    /// Feature splits address `split` the same way non-base modules do;
    /// kept as a distinct name because the pipeline calls it at a
    /// different stage than the generic `set_split_id`.
    pub fn set_split_id_for_feature_split(&mut self, id: impl Into<String>) -> &mut Self {
        self.set_split_id(id)
    }

    pub fn set_config_for_split(&mut self, base_module_name: impl Into<String>) -> &mut Self {
        self.root().set_attr(XmlAttribute::new(
            None,
            rid::CONFIG_FOR_SPLIT_ATTR,
            AttributeValue::Str(base_module_name.into()),
        ));
        self
    }

    pub fn set_has_code(&mut self, has_code: bool) -> &mut Self {
        self.application().set_attr(
            XmlAttribute::new(Some(rid::ANDROID_NS), "hasCode", AttributeValue::Bool(has_code))
                .with_resource_id(rid::HAS_CODE),
        );
        self
    }

    pub fn set_extract_native_libs(&mut self, value: bool) -> &mut Self {
        self.application().set_attr(
            XmlAttribute::new(Some(rid::ANDROID_NS), "extractNativeLibs", AttributeValue::Bool(value))
                .with_resource_id(rid::EXTRACT_NATIVE_LIBS),
        );
        self
    }

    pub fn set_target_sandbox_version(&mut self, value: i64) -> &mut Self {
        self.root().set_attr(
            XmlAttribute::new(Some(rid::ANDROID_NS), "targetSandboxVersion", AttributeValue::Int(value))
                .with_resource_id(rid::TARGET_SANDBOX_VERSION),
        );
        self
    }

    /// Idempotent by key: a second call with the same `key` replaces the
    /// previous `<meta-data>` element rather than appending a duplicate.
    pub fn add_meta_data(&mut self, key: &str, value: MetadataValue) -> &mut Self {
        let node = value.into_meta_data_node(key);
        let app = self.application();
        if let Some(existing) = app.children.iter_mut().find(|c| {
            c.name == "meta-data"
                && c.attr_by_id_or_name(Some(rid::NAME), Some(rid::ANDROID_NS), "name")
                    .and_then(|a| a.value.as_str())
                    == Some(key)
        }) {
            *existing = node;
        } else {
            app.push_child(node);
        }
        self
    }

    /// Sorted, deduplicated, comma-joined into the fused-modules
    /// metadata key, and mirrored onto `android:isSplitRequired`.
    pub fn set_fused_module_names(&mut self, names: impl IntoIterator<Item = String>) -> &mut Self {
        let mut sorted: Vec<String> = names.into_iter().collect::<HashSet<_>>().into_iter().collect();
        sorted.sort();
        let joined = sorted.join(",");
        self.add_meta_data(FUSED_MODULES_METADATA_KEY, MetadataValue::Str(joined));
        if !sorted.is_empty() {
            self.application().set_attr(
                XmlAttribute::new(Some(rid::ANDROID_NS), "isSplitRequired", AttributeValue::Bool(true))
                    .with_resource_id(rid::IS_SPLIT_REQUIRED),
            );
        }
        self
    }

    pub fn set_locale_config(&mut self, resource_ref: u32) -> &mut Self {
        self.application().set_attr(XmlAttribute::new(
            Some(rid::ANDROID_NS),
            "localeConfig",
            AttributeValue::ResourceRef(resource_ref),
        ));
        self
    }

    pub fn set_icon(&mut self, resource_ref: u32) -> &mut Self {
        self.application().set_attr(
            XmlAttribute::new(Some(rid::ANDROID_NS), "icon", AttributeValue::ResourceRef(resource_ref))
                .with_resource_id(rid::ICON),
        );
        self
    }

    pub fn set_round_icon(&mut self, resource_ref: u32) -> &mut Self {
        self.application().set_attr(
            XmlAttribute::new(Some(rid::ANDROID_NS), "roundIcon", AttributeValue::ResourceRef(resource_ref))
                .with_resource_id(rid::ROUND_ICON),
        );
        self
    }

    pub fn set_allow_backup(&mut self, value: bool) -> &mut Self {
        self.application().set_attr(
            XmlAttribute::new(Some(rid::ANDROID_NS), "allowBackup", AttributeValue::Bool(value))
                .with_resource_id(rid::ALLOW_BACKUP),
        );
        self
    }

    /// Used when converting an installed split back to an instant split:
    /// instant manifests never carry `split`.
    pub fn remove_split_name(&mut self) -> &mut Self {
        self.root().remove_attr(None, rid::SPLIT_ATTR);
        self
    }

    /// Strips `<activity|service|provider|receiver>` elements whose
    /// `android:splitName` names a module that is not in `known_modules`
    /// — leftovers from a module that got fused away.
    pub fn remove_unknown_split_components(&mut self, known_modules: &HashSet<String>) -> &mut Self {
        let app = self.application();
        app.children.retain(|c| {
            if !matches!(c.name.as_str(), "activity" | "service" | "provider" | "receiver") {
                return true;
            }
            match c
                .attr_by_id_or_name(Some(rid::SPLIT_NAME), Some(rid::ANDROID_NS), "splitName")
                .and_then(|a| a.value.as_str())
            {
                Some(split_name) => known_modules.contains(split_name),
                None => true,
            }
        });
        self
    }

    /// Appends a `<uses-sdk-library>` declaration; additive, not
    /// idempotent — callers are responsible for not adding the same
    /// library twice.
    pub fn add_uses_sdk_library(
        &mut self,
        name: &str,
        version_major: i64,
        certificate_digest: &str,
    ) -> &mut Self {
        let mut node = XmlNode::new("uses-sdk-library");
        node.set_attr(
            XmlAttribute::new(Some(rid::ANDROID_NS), "name", AttributeValue::Str(name.to_string()))
                .with_resource_id(rid::NAME),
        );
        node.set_attr(XmlAttribute::new(
            Some(rid::ANDROID_NS),
            "versionMajor",
            AttributeValue::Int(version_major),
        ));
        node.set_attr(XmlAttribute::new(
            Some(rid::ANDROID_NS),
            "certDigest",
            AttributeValue::Str(certificate_digest.to_string()),
        ));
        self.application().push_child(node);
        self
    }

    /// Idempotent: declares (or updates) this module's own `<sdk-library>`
    /// element, used when the module being edited is itself a
    /// runtime-enabled SDK.
    pub fn set_sdk_library_element(&mut self, name: &str, version_major: i64) -> &mut Self {
        let root = self.root();
        let node = root.find_or_create_child("sdk-library");
        node.set_attr(
            XmlAttribute::new(Some(rid::ANDROID_NS), "name", AttributeValue::Str(name.to_string()))
                .with_resource_id(rid::NAME),
        );
        node.set_attr(XmlAttribute::new(
            Some(rid::ANDROID_NS),
            "versionMajor",
            AttributeValue::Int(version_major),
        ));
        self
    }

    /// Builds `<dist:module><dist:delivery><dist:install-time>
    /// <dist:removable dist:value="..."/></dist:install-time></dist:delivery>
    /// <dist:fusing dist:include="true"/></dist:module>`.
    pub fn build_delivery_tree(&mut self, removable: bool) -> &mut Self {
        let root = self.root();
        let module = root.find_or_create_child("dist:module");

        let delivery = module.find_or_create_child("dist:delivery");
        let install_time = delivery.find_or_create_child("dist:install-time");
        let removable_node = install_time.find_or_create_child("dist:removable");
        removable_node.set_attr(XmlAttribute::new(
            Some(rid::DIST_NS),
            "value",
            AttributeValue::Bool(removable),
        ));

        let fusing = module.find_or_create_child("dist:fusing");
        fusing.set_attr(XmlAttribute::new(Some(rid::DIST_NS), "include", AttributeValue::Bool(true)));
        self
    }

    /// Deletes every subtree whose root carries a truthy
    /// `requiredByPrivacySandboxSdk` marker attribute. When
    /// `strip_marker_attr` is set, the marker is also removed from every
    /// surviving node so its presence doesn't leak into the final
    /// manifest.
    pub fn remove_elements_required_by_privacy_sandbox_sdk(&mut self, strip_marker_attr: bool) -> &mut Self {
        strip_privacy_sandbox_subtree(self.root(), strip_marker_attr);
        self
    }
}

const PRIVACY_SANDBOX_MARKER: &str = "requiredByPrivacySandboxSdk";

fn strip_privacy_sandbox_subtree(node: &mut XmlNode, strip_marker_attr: bool) {
    node.children.retain_mut(|child| {
        let marked = child
            .attr_by_id_or_name(None, None, PRIVACY_SANDBOX_MARKER)
            .and_then(|a| a.value.as_bool())
            .unwrap_or(false);
        if marked {
            return false;
        }
        if strip_marker_attr {
            child.remove_attr(None, PRIVACY_SANDBOX_MARKER);
        }
        strip_privacy_sandbox_subtree(child, strip_marker_attr);
        true
    });
}
