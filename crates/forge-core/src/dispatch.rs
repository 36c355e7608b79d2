//! Per-kind rewrite rules.
//!
//! For every [`IdentifierKind`] the table lists which shard categories can
//! reference it and the transform that rewrites one document of that category.
//! Each kind has at most one rule per category, so a document is read and
//! written at most once per run.
//!
//! | Kind         | Categories                                                     |
//! |--------------|----------------------------------------------------------------|
//! | `tag`        | project, catalog:tags, spec, asset                             |
//! | `tagGroup`   | project, catalog:tags, spec, asset (namespace prefix)          |
//! | `assetType`  | catalog:assetTypes, catalog:tags, spec, checkpoint, lora       |
//! | `style`      | project, catalog:styles, spec                                  |
//! | `scenario`   | project, catalog:scenarios, spec                               |
//! | `palette`    | project, catalog:palettes                                      |
//! | `checkpoint` | spec, checkpoint, lora                                         |
//! | `lora`       | spec, lora                                                     |

use crate::kind::IdentifierKind;
use crate::layout::ShardCategory;
use crate::matching::{
    namespace_prefix, replace_group_prefix_in_array, replace_in_array, replace_prefix,
};
use serde_json::Value;

/// Reserved tag namespace for asset types (`assetType:<assetTypeId>`).
pub const ASSET_TYPE_TAG_NAMESPACE: &str = "assetType";

/// The compound tag that names an asset type.
pub fn asset_type_tag(asset_type_id: &str) -> String {
    format!("{}{}", namespace_prefix(ASSET_TYPE_TAG_NAMESPACE), asset_type_id)
}

/// Old and new identifier handed to every transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rename<'a> {
    pub from: &'a str,
    pub to: &'a str,
}

impl<'a> Rename<'a> {
    pub fn new(from: &'a str, to: &'a str) -> Self {
        Self { from, to }
    }
}

/// Rewrites one document in place. Returns true if anything changed.
pub type Transform = fn(&mut Value, &Rename<'_>) -> bool;

/// One row of the dispatch table.
#[derive(Clone, Copy)]
pub struct Rule {
    pub category: ShardCategory,
    /// Fields the transform inspects, for logs and docs.
    pub fields: &'static str,
    pub transform: Transform,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("category", &self.category)
            .field("fields", &self.fields)
            .finish()
    }
}

const TAG_RULES: &[Rule] = &[
    Rule {
        category: ShardCategory::Project,
        fields: "defaults.tagIds[]",
        transform: tag_project,
    },
    Rule {
        category: ShardCategory::TagsCatalog,
        fields: "groups[].tags[].id",
        transform: tag_catalog,
    },
    Rule {
        category: ShardCategory::Spec,
        fields: "tags[]",
        transform: tag_spec,
    },
    Rule {
        category: ShardCategory::Asset,
        fields: "versions[].variants[].tags[]",
        transform: tag_asset,
    },
];

const TAG_GROUP_RULES: &[Rule] = &[
    Rule {
        category: ShardCategory::Project,
        fields: "defaults.tagIds[] (namespace)",
        transform: tag_group_project,
    },
    Rule {
        category: ShardCategory::TagsCatalog,
        fields: "groups[].id, groups[].tags[].id (namespace)",
        transform: tag_group_catalog,
    },
    Rule {
        category: ShardCategory::Spec,
        fields: "tags[] (namespace)",
        transform: tag_group_spec,
    },
    Rule {
        category: ShardCategory::Asset,
        fields: "versions[].variants[].tags[] (namespace)",
        transform: tag_group_asset,
    },
];

const ASSET_TYPE_RULES: &[Rule] = &[
    Rule {
        category: ShardCategory::AssetTypesCatalog,
        fields: "assetTypes[].id, assetTypes[].defaultTags[]",
        transform: asset_type_catalog,
    },
    Rule {
        category: ShardCategory::TagsCatalog,
        fields: "groups[].tags[].id (assetType:<id>)",
        transform: asset_type_tags_catalog,
    },
    Rule {
        category: ShardCategory::Spec,
        fields: "assetType",
        transform: asset_type_spec,
    },
    Rule {
        category: ShardCategory::Checkpoint,
        fields: "supportedAssetTypes[]",
        transform: asset_type_checkpoint,
    },
    Rule {
        category: ShardCategory::Lora,
        fields: "assetTypes[]",
        transform: asset_type_lora,
    },
];

const STYLE_RULES: &[Rule] = &[
    Rule {
        category: ShardCategory::Project,
        fields: "defaults.style",
        transform: style_project,
    },
    Rule {
        category: ShardCategory::StylesCatalog,
        fields: "styles[].id",
        transform: style_catalog,
    },
    Rule {
        category: ShardCategory::Spec,
        fields: "style",
        transform: style_spec,
    },
];

const SCENARIO_RULES: &[Rule] = &[
    Rule {
        category: ShardCategory::Project,
        fields: "defaults.scenario",
        transform: scenario_project,
    },
    Rule {
        category: ShardCategory::ScenariosCatalog,
        fields: "scenarios[].id",
        transform: scenario_catalog,
    },
    Rule {
        category: ShardCategory::Spec,
        fields: "scenario",
        transform: scenario_spec,
    },
];

const PALETTE_RULES: &[Rule] = &[
    Rule {
        category: ShardCategory::Project,
        fields: "defaults.paletteIds[]",
        transform: palette_project,
    },
    Rule {
        category: ShardCategory::PalettesCatalog,
        fields: "palettes[].id",
        transform: palette_catalog,
    },
];

const CHECKPOINT_RULES: &[Rule] = &[
    Rule {
        category: ShardCategory::Spec,
        fields: "checkpointId",
        transform: checkpoint_spec,
    },
    Rule {
        category: ShardCategory::Checkpoint,
        fields: "id",
        transform: checkpoint_own_id,
    },
    Rule {
        category: ShardCategory::Lora,
        fields: "checkpointId",
        transform: checkpoint_lora,
    },
];

const LORA_RULES: &[Rule] = &[
    Rule {
        category: ShardCategory::Spec,
        fields: "loraIds[]",
        transform: lora_spec,
    },
    Rule {
        category: ShardCategory::Lora,
        fields: "id",
        transform: lora_own_id,
    },
];

/// Dispatch table rows for `kind`, in processing order.
pub fn rules(kind: IdentifierKind) -> &'static [Rule] {
    match kind {
        IdentifierKind::Tag => TAG_RULES,
        IdentifierKind::TagGroup => TAG_GROUP_RULES,
        IdentifierKind::AssetType => ASSET_TYPE_RULES,
        IdentifierKind::Style => STYLE_RULES,
        IdentifierKind::Scenario => SCENARIO_RULES,
        IdentifierKind::Palette => PALETTE_RULES,
        IdentifierKind::Checkpoint => CHECKPOINT_RULES,
        IdentifierKind::Lora => LORA_RULES,
    }
}

/// The rule for `(kind, category)`, if the kind touches that category.
pub fn rule_for(kind: IdentifierKind, category: ShardCategory) -> Option<&'static Rule> {
    rules(kind).iter().find(|rule| rule.category == category)
}

/// The category whose documents are keyed by the identifier itself.
pub fn primary_key_category(kind: IdentifierKind) -> Option<ShardCategory> {
    match kind {
        IdentifierKind::Checkpoint => Some(ShardCategory::Checkpoint),
        IdentifierKind::Lora => Some(ShardCategory::Lora),
        _ => None,
    }
}

/// Run the `(kind, category)` transform over `doc`.
///
/// Returns false without touching `doc` when the kind has no rule for the
/// category.
pub fn apply(
    kind: IdentifierKind,
    category: ShardCategory,
    doc: &mut Value,
    rename: &Rename<'_>,
) -> bool {
    match rule_for(kind, category) {
        Some(rule) => (rule.transform)(doc, rename),
        None => false,
    }
}

// ----------------------------------------------------------------------------
// Field helpers
// ----------------------------------------------------------------------------

fn set_if_equal(parent: &mut Value, key: &str, from: &str, to: &str) -> bool {
    match parent.get_mut(key) {
        Some(slot) if slot.as_str() == Some(from) => {
            *slot = Value::String(to.to_string());
            true
        }
        _ => false,
    }
}

fn set_if_prefixed(parent: &mut Value, key: &str, prefix_from: &str, prefix_to: &str) -> bool {
    let Some(slot) = parent.get_mut(key) else {
        return false;
    };
    let next = match slot.as_str() {
        Some(current) if current.starts_with(prefix_from) => {
            replace_prefix(current, prefix_from, prefix_to).into_owned()
        }
        _ => return false,
    };
    *slot = Value::String(next);
    true
}

fn rewrite_array(
    parent: &mut Value,
    key: &str,
    rewrite: impl FnOnce(&[Value]) -> (bool, Vec<Value>),
) -> bool {
    let Some(Value::Array(items)) = parent.get_mut(key) else {
        return false;
    };
    let (changed, next) = rewrite(items.as_slice());
    if changed {
        *items = next;
    }
    changed
}

fn exact_array(parent: &mut Value, key: &str, from: &str, to: &str) -> bool {
    rewrite_array(parent, key, |items| replace_in_array(items, from, to))
}

fn group_prefix_array(parent: &mut Value, key: &str, group_from: &str, group_to: &str) -> bool {
    rewrite_array(parent, key, |items| {
        replace_group_prefix_in_array(items, group_from, group_to)
    })
}

/// Mutable iterator over the elements of `parent[key]` when it is an array.
fn entries<'v>(parent: &'v mut Value, key: &str) -> impl Iterator<Item = &'v mut Value> {
    parent
        .get_mut(key)
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
}

fn catalog_entry_ids(doc: &mut Value, list_key: &str, rename: &Rename<'_>) -> bool {
    let mut changed = false;
    for entry in entries(doc, list_key) {
        changed |= set_if_equal(entry, "id", rename.from, rename.to);
    }
    changed
}

fn variant_tags(doc: &mut Value, rewrite: impl Fn(&mut Value) -> bool) -> bool {
    let mut changed = false;
    for version in entries(doc, "versions") {
        for variant in entries(version, "variants") {
            changed |= rewrite(variant);
        }
    }
    changed
}

fn project_defaults(doc: &mut Value) -> Option<&mut Value> {
    doc.get_mut("defaults").filter(|d| d.is_object())
}

// ----------------------------------------------------------------------------
// tag
// ----------------------------------------------------------------------------

fn tag_project(doc: &mut Value, rename: &Rename<'_>) -> bool {
    project_defaults(doc).is_some_and(|d| exact_array(d, "tagIds", rename.from, rename.to))
}

fn tag_catalog(doc: &mut Value, rename: &Rename<'_>) -> bool {
    let mut changed = false;
    for group in entries(doc, "groups") {
        for tag in entries(group, "tags") {
            changed |= set_if_equal(tag, "id", rename.from, rename.to);
        }
    }
    changed
}

fn tag_spec(doc: &mut Value, rename: &Rename<'_>) -> bool {
    exact_array(doc, "tags", rename.from, rename.to)
}

fn tag_asset(doc: &mut Value, rename: &Rename<'_>) -> bool {
    variant_tags(doc, |variant| {
        exact_array(variant, "tags", rename.from, rename.to)
    })
}

// ----------------------------------------------------------------------------
// tagGroup
// ----------------------------------------------------------------------------

fn tag_group_project(doc: &mut Value, rename: &Rename<'_>) -> bool {
    project_defaults(doc)
        .is_some_and(|d| group_prefix_array(d, "tagIds", rename.from, rename.to))
}

fn tag_group_catalog(doc: &mut Value, rename: &Rename<'_>) -> bool {
    let prefix_from = namespace_prefix(rename.from);
    let prefix_to = namespace_prefix(rename.to);

    let mut changed = false;
    for group in entries(doc, "groups") {
        changed |= set_if_equal(group, "id", rename.from, rename.to);
        for tag in entries(group, "tags") {
            changed |= set_if_prefixed(tag, "id", &prefix_from, &prefix_to);
        }
    }
    changed
}

fn tag_group_spec(doc: &mut Value, rename: &Rename<'_>) -> bool {
    group_prefix_array(doc, "tags", rename.from, rename.to)
}

fn tag_group_asset(doc: &mut Value, rename: &Rename<'_>) -> bool {
    variant_tags(doc, |variant| {
        group_prefix_array(variant, "tags", rename.from, rename.to)
    })
}

// ----------------------------------------------------------------------------
// assetType
// ----------------------------------------------------------------------------

fn asset_type_catalog(doc: &mut Value, rename: &Rename<'_>) -> bool {
    let tag_from = asset_type_tag(rename.from);
    let tag_to = asset_type_tag(rename.to);

    let mut changed = false;
    for asset_type in entries(doc, "assetTypes") {
        changed |= set_if_equal(asset_type, "id", rename.from, rename.to);
        changed |= exact_array(asset_type, "defaultTags", &tag_from, &tag_to);
    }
    changed
}

// Reserved-namespace pass over the tag catalog. Kept apart from the tagGroup
// rule: only the exact `assetType:<from>` id matches.
fn asset_type_tags_catalog(doc: &mut Value, rename: &Rename<'_>) -> bool {
    let tag_from = asset_type_tag(rename.from);
    let tag_to = asset_type_tag(rename.to);
    tag_catalog(doc, &Rename::new(&tag_from, &tag_to))
}

fn asset_type_spec(doc: &mut Value, rename: &Rename<'_>) -> bool {
    set_if_equal(doc, "assetType", rename.from, rename.to)
}

fn asset_type_checkpoint(doc: &mut Value, rename: &Rename<'_>) -> bool {
    exact_array(doc, "supportedAssetTypes", rename.from, rename.to)
}

fn asset_type_lora(doc: &mut Value, rename: &Rename<'_>) -> bool {
    exact_array(doc, "assetTypes", rename.from, rename.to)
}

// ----------------------------------------------------------------------------
// style / scenario / palette
// ----------------------------------------------------------------------------

fn style_project(doc: &mut Value, rename: &Rename<'_>) -> bool {
    project_defaults(doc).is_some_and(|d| set_if_equal(d, "style", rename.from, rename.to))
}

fn style_catalog(doc: &mut Value, rename: &Rename<'_>) -> bool {
    catalog_entry_ids(doc, "styles", rename)
}

fn style_spec(doc: &mut Value, rename: &Rename<'_>) -> bool {
    set_if_equal(doc, "style", rename.from, rename.to)
}

fn scenario_project(doc: &mut Value, rename: &Rename<'_>) -> bool {
    project_defaults(doc).is_some_and(|d| set_if_equal(d, "scenario", rename.from, rename.to))
}

fn scenario_catalog(doc: &mut Value, rename: &Rename<'_>) -> bool {
    catalog_entry_ids(doc, "scenarios", rename)
}

fn scenario_spec(doc: &mut Value, rename: &Rename<'_>) -> bool {
    set_if_equal(doc, "scenario", rename.from, rename.to)
}

fn palette_project(doc: &mut Value, rename: &Rename<'_>) -> bool {
    project_defaults(doc).is_some_and(|d| exact_array(d, "paletteIds", rename.from, rename.to))
}

fn palette_catalog(doc: &mut Value, rename: &Rename<'_>) -> bool {
    catalog_entry_ids(doc, "palettes", rename)
}

// ----------------------------------------------------------------------------
// checkpoint / lora
// ----------------------------------------------------------------------------

fn checkpoint_spec(doc: &mut Value, rename: &Rename<'_>) -> bool {
    set_if_equal(doc, "checkpointId", rename.from, rename.to)
}

fn checkpoint_own_id(doc: &mut Value, rename: &Rename<'_>) -> bool {
    set_if_equal(doc, "id", rename.from, rename.to)
}

fn checkpoint_lora(doc: &mut Value, rename: &Rename<'_>) -> bool {
    set_if_equal(doc, "checkpointId", rename.from, rename.to)
}

fn lora_spec(doc: &mut Value, rename: &Rename<'_>) -> bool {
    exact_array(doc, "loraIds", rename.from, rename.to)
}

fn lora_own_id(doc: &mut Value, rename: &Rename<'_>) -> bool {
    set_if_equal(doc, "id", rename.from, rename.to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(kind: IdentifierKind, category: ShardCategory, doc: &mut Value, from: &str, to: &str) -> bool {
        apply(kind, category, doc, &Rename::new(from, to))
    }

    #[test]
    fn test_every_kind_has_rules_without_duplicate_categories() {
        for kind in IdentifierKind::ALL {
            let rows = rules(kind);
            assert!(!rows.is_empty(), "{kind} has no rules");
            for (i, row) in rows.iter().enumerate() {
                assert!(
                    rows[i + 1..].iter().all(|other| other.category != row.category),
                    "{kind} lists {} twice",
                    row.category
                );
            }
        }
    }

    #[test]
    fn test_primary_key_category_has_rule() {
        for kind in IdentifierKind::ALL {
            if let Some(category) = primary_key_category(kind) {
                assert!(kind.is_primary_key());
                assert!(rule_for(kind, category).is_some());
            }
        }
    }

    #[test]
    fn test_tag_rewrites_project_spec_asset_and_catalog() {
        let mut project = json!({"name": "P", "defaults": {"tagIds": ["hero", "villain"]}});
        assert!(run(IdentifierKind::Tag, ShardCategory::Project, &mut project, "hero", "champion"));
        assert_eq!(project["defaults"]["tagIds"], json!(["champion", "villain"]));

        let mut spec = json!({"tags": ["hero", "ui:hero"]});
        assert!(run(IdentifierKind::Tag, ShardCategory::Spec, &mut spec, "hero", "champion"));
        assert_eq!(spec["tags"], json!(["champion", "ui:hero"]));

        let mut asset = json!({"versions": [
            {"variants": [{"tags": ["hero"]}, {"tags": ["other"]}]},
            {"variants": [{"tags": ["hero", "hero"]}]}
        ]});
        assert!(run(IdentifierKind::Tag, ShardCategory::Asset, &mut asset, "hero", "champion"));
        assert_eq!(asset["versions"][0]["variants"][0]["tags"], json!(["champion"]));
        assert_eq!(asset["versions"][0]["variants"][1]["tags"], json!(["other"]));
        assert_eq!(
            asset["versions"][1]["variants"][0]["tags"],
            json!(["champion", "champion"])
        );

        let mut catalog = json!({"groups": [{"id": "hero", "tags": [{"id": "hero"}]}]});
        assert!(run(IdentifierKind::Tag, ShardCategory::TagsCatalog, &mut catalog, "hero", "champion"));
        assert_eq!(catalog, json!({"groups": [{"id": "hero", "tags": [{"id": "champion"}]}]}));
    }

    #[test]
    fn test_tag_group_rewrites_namespace_only() {
        let mut spec = json!({"tags": ["weapons:sword", "loot:weapons", "weapons"]});
        assert!(run(IdentifierKind::TagGroup, ShardCategory::Spec, &mut spec, "weapons", "armaments"));
        assert_eq!(spec["tags"], json!(["armaments:sword", "loot:weapons", "weapons"]));
    }

    #[test]
    fn test_tag_group_catalog() {
        let mut catalog = json!({"groups": [
            {"id": "ui", "label": "UI", "tags": [{"id": "ui:button", "label": "Button"}]},
            {"id": "quality", "tags": [{"id": "quality:a"}, {"id": "quality:ui"}]}
        ]});
        assert!(run(IdentifierKind::TagGroup, ShardCategory::TagsCatalog, &mut catalog, "ui", "widgets"));
        assert_eq!(catalog["groups"][0]["id"], "widgets");
        assert_eq!(catalog["groups"][0]["tags"][0]["id"], "widgets:button");
        assert_eq!(catalog["groups"][0]["tags"][0]["label"], "Button");
        assert_eq!(catalog["groups"][1]["tags"][1]["id"], "quality:ui");
    }

    #[test]
    fn test_asset_type_catalogs() {
        let mut types = json!({"assetTypes": [
            {"id": "sprite", "defaultTags": ["assetType:sprite", "sprite"]},
            {"id": "tile", "defaultTags": ["assetType:tile"]}
        ]});
        assert!(run(IdentifierKind::AssetType, ShardCategory::AssetTypesCatalog, &mut types, "sprite", "character"));
        assert_eq!(types["assetTypes"][0]["id"], "character");
        assert_eq!(types["assetTypes"][0]["defaultTags"], json!(["assetType:character", "sprite"]));
        assert_eq!(types["assetTypes"][1]["defaultTags"], json!(["assetType:tile"]));

        let mut tags = json!({"groups": [{"id": "assetType", "tags": [
            {"id": "assetType:sprite"}, {"id": "sprite"}, {"id": "assetType:sprite_sheet"}
        ]}]});
        assert!(run(IdentifierKind::AssetType, ShardCategory::TagsCatalog, &mut tags, "sprite", "character"));
        assert_eq!(
            tags["groups"][0]["tags"],
            json!([{"id": "assetType:character"}, {"id": "sprite"}, {"id": "assetType:sprite_sheet"}])
        );
        assert_eq!(tags["groups"][0]["id"], "assetType");
    }

    #[test]
    fn test_asset_type_namespace_is_not_a_tag_group_rename() {
        // An asset type whose id equals a tag group id must not touch that group.
        let mut tags = json!({"groups": [{"id": "ui", "tags": [{"id": "ui:button"}]}]});
        assert!(!run(IdentifierKind::AssetType, ShardCategory::TagsCatalog, &mut tags, "ui", "widgets"));
        assert_eq!(tags, json!({"groups": [{"id": "ui", "tags": [{"id": "ui:button"}]}]}));
    }

    #[test]
    fn test_asset_type_model_records() {
        let mut spec = json!({"assetType": "sprite", "tags": ["assetType:sprite"]});
        assert!(run(IdentifierKind::AssetType, ShardCategory::Spec, &mut spec, "sprite", "character"));
        assert_eq!(spec, json!({"assetType": "character", "tags": ["assetType:sprite"]}));

        let mut checkpoint = json!({"id": "sdxl", "supportedAssetTypes": ["sprite", "tile"]});
        assert!(run(IdentifierKind::AssetType, ShardCategory::Checkpoint, &mut checkpoint, "sprite", "character"));
        assert_eq!(checkpoint["supportedAssetTypes"], json!(["character", "tile"]));

        let mut lora = json!({"id": "l1", "assetTypes": ["sprite"]});
        assert!(run(IdentifierKind::AssetType, ShardCategory::Lora, &mut lora, "sprite", "character"));
        assert_eq!(lora["assetTypes"], json!(["character"]));
    }

    #[test]
    fn test_scalar_kinds() {
        let mut project = json!({"defaults": {"style": "pixel", "scenario": "forest", "paletteIds": ["warm", "cold"]}});
        assert!(run(IdentifierKind::Style, ShardCategory::Project, &mut project, "pixel", "voxel"));
        assert!(run(IdentifierKind::Scenario, ShardCategory::Project, &mut project, "forest", "jungle"));
        assert!(run(IdentifierKind::Palette, ShardCategory::Project, &mut project, "cold", "icy"));
        assert_eq!(
            project,
            json!({"defaults": {"style": "voxel", "scenario": "jungle", "paletteIds": ["warm", "icy"]}})
        );

        let mut styles = json!({"styles": [{"id": "pixel"}, {"id": "ink"}]});
        assert!(run(IdentifierKind::Style, ShardCategory::StylesCatalog, &mut styles, "pixel", "voxel"));
        assert_eq!(styles, json!({"styles": [{"id": "voxel"}, {"id": "ink"}]}));

        let mut palettes = json!({"palettes": [{"id": "cold"}]});
        assert!(run(IdentifierKind::Palette, ShardCategory::PalettesCatalog, &mut palettes, "cold", "icy"));
        assert_eq!(palettes["palettes"][0]["id"], "icy");
    }

    #[test]
    fn test_style_leaves_references_of_other_kinds() {
        let original = json!({
            "style": "pixel",
            "tags": ["pixel", "style:pixel"],
            "loraIds": ["pixel"],
            "checkpointId": "pixel",
            "scenario": "pixel"
        });
        let mut spec = original.clone();
        assert!(run(IdentifierKind::Style, ShardCategory::Spec, &mut spec, "pixel", "voxel"));
        assert_eq!(spec["style"], "voxel");
        assert_eq!(spec["tags"], original["tags"]);
        assert_eq!(spec["loraIds"], original["loraIds"]);
        assert_eq!(spec["checkpointId"], original["checkpointId"]);
        assert_eq!(spec["scenario"], original["scenario"]);
    }

    #[test]
    fn test_checkpoint_and_lora() {
        let mut spec = json!({"checkpointId": "sd15", "loraIds": ["lora_7", "lora_9"]});
        assert!(run(IdentifierKind::Checkpoint, ShardCategory::Spec, &mut spec, "sd15", "sdxl"));
        assert!(run(IdentifierKind::Lora, ShardCategory::Spec, &mut spec, "lora_7", "lora_8"));
        assert_eq!(spec, json!({"checkpointId": "sdxl", "loraIds": ["lora_8", "lora_9"]}));

        let mut lora = json!({"id": "lora_7", "checkpointId": "sd15"});
        assert!(run(IdentifierKind::Checkpoint, ShardCategory::Lora, &mut lora, "sd15", "sdxl"));
        assert!(run(IdentifierKind::Lora, ShardCategory::Lora, &mut lora, "lora_7", "lora_8"));
        assert_eq!(lora, json!({"id": "lora_8", "checkpointId": "sdxl"}));
    }

    #[test]
    fn test_unrelated_category_is_untouched() {
        let mut doc = json!({"tags": ["hero"]});
        assert!(!run(IdentifierKind::Palette, ShardCategory::Spec, &mut doc, "hero", "x"));
        assert!(!run(IdentifierKind::Lora, ShardCategory::Asset, &mut doc, "hero", "x"));
        assert_eq!(doc, json!({"tags": ["hero"]}));
    }

    #[test]
    fn test_malformed_shapes_are_ignored() {
        let mut doc = json!({"tags": "hero", "defaults": ["hero"], "groups": {"id": "hero"}});
        let before = doc.clone();
        assert!(!run(IdentifierKind::Tag, ShardCategory::Spec, &mut doc, "hero", "x"));
        assert!(!run(IdentifierKind::Tag, ShardCategory::Project, &mut doc, "hero", "x"));
        assert!(!run(IdentifierKind::Tag, ShardCategory::TagsCatalog, &mut doc, "hero", "x"));
        assert_eq!(doc, before);

        let mut not_object = json!(["hero"]);
        assert!(!run(IdentifierKind::Tag, ShardCategory::Spec, &mut not_object, "hero", "x"));
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let mut spec = json!({"tags": ["ui:button"]});
        assert!(run(IdentifierKind::TagGroup, ShardCategory::Spec, &mut spec, "ui", "widgets"));
        assert!(!run(IdentifierKind::TagGroup, ShardCategory::Spec, &mut spec, "ui", "widgets"));
    }
}
