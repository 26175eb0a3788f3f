//! Readers for the engine hint keys carried by schema property nodes.
//!
//! Each reader looks at one property node and returns `None` when its hint is
//! absent, malformed or blank.

use serde_json::Value;

use super::ValueShape;
use crate::schema::json::{self, Object};

/// Editor component hint under `hytale.uiEditorComponent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiDataSet {
    pub component: String,
    pub data_set: String,
}

/// Parent lookup hint under `hytaleParent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentDomain {
    pub domain: String,
    pub map_key: Option<String>,
    pub map_key_value: Option<String>,
}

/// Common asset hint under `hytaleCommonAsset`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonAsset {
    pub required_roots: Vec<String>,
    pub required_extension: Option<String>,
    pub is_ui_asset: Option<bool>,
}

/// Discriminator hint under `hytaleSchemaTypeField`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeField {
    pub property: String,
    pub values: Vec<String>,
    pub default_value: Option<String>,
    pub parent_property_key: Option<String>,
}

fn editor_component(node: &Object) -> Option<&Object> {
    json::object_path(node, &["hytale", "uiEditorComponent"])
}

fn hytale_type(node: &Object) -> Option<&str> {
    json::object(node, "hytale").and_then(|hytale| json::string(hytale, "type"))
}

/// Value shape from the declared JSON type, or `fallback`
pub fn value_shape(node: &Object, fallback: ValueShape) -> ValueShape {
    match node.get("type") {
        Some(Value::String(ty)) => ValueShape::from_json_type(ty).unwrap_or(fallback),
        Some(Value::Array(types)) => {
            let types: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
            if types.contains(&"string") && types.contains(&"object") {
                return ValueShape::StringOrObject;
            }
            types
                .first()
                .and_then(|ty| ValueShape::from_json_type(ty))
                .unwrap_or(fallback)
        }
        _ => fallback,
    }
}

/// Asset type of an `anyOf` branch that is itself a string-or-`$ref` union
pub fn contained_asset_type(node: &Object) -> Option<&str> {
    node.get("anyOf")?
        .as_array()?
        .iter()
        .filter_map(Value::as_object)
        .find_map(|option| {
            let asset_type = json::string(option, "hytaleAssetRef")?;
            let nested = option.get("anyOf").and_then(Value::as_array)?;
            is_string_or_ref_union(nested).then_some(asset_type)
        })
}

fn is_string_or_ref_union(options: &[Value]) -> bool {
    let options: Vec<&Object> = options.iter().filter_map(Value::as_object).collect();
    let has_string = options
        .iter()
        .any(|option| json::string(option, "type") == Some("string"));
    let has_ref = options.iter().any(|option| option.contains_key("$ref"));
    has_string && has_ref
}

/// Allowed keys of an `EnumMap` object
pub fn enum_map_keys(node: &Object) -> Vec<String> {
    if hytale_type(node) != Some("EnumMap") {
        return Vec::new();
    }
    json::string_list(json::object(node, "propertyNames").and_then(|names| names.get("enum")))
}

/// Registry domain constraining the keys of a map object
pub fn map_key_domain(node: &Object) -> Option<&str> {
    json::object(node, "propertyNames").and_then(|names| json::non_blank(names, "hytaleAssetRef"))
}

/// Registry domain of a direct asset reference
pub fn registry_domain(node: &Object) -> Option<&str> {
    json::non_blank(node, "hytaleAssetRef").or_else(|| json::non_blank(node, "hytaleCustomAssetRef"))
}

/// Literal `enum` values
pub fn enum_values(node: &Object) -> Vec<String> {
    json::string_list(node.get("enum"))
}

pub fn common_asset(node: &Object) -> Option<CommonAsset> {
    let hint = json::object(node, "hytaleCommonAsset")?;
    Some(CommonAsset {
        required_roots: json::string_list(hint.get("requiredRoots")),
        required_extension: json::string(hint, "requiredExtension").map(str::to_string),
        is_ui_asset: json::flag(hint, "isUIAsset"),
    })
}

pub fn is_localization_key(node: &Object) -> bool {
    editor_component(node).and_then(|c| json::string(c, "component")) == Some("LocalizationKey")
}

pub fn cosmetic_domain(node: &Object) -> Option<&str> {
    json::non_blank(node, "hytaleCosmeticAsset")
}

pub fn parent_domain(node: &Object) -> Option<ParentDomain> {
    let hint = json::object(node, "hytaleParent")?;
    Some(ParentDomain {
        domain: json::non_blank(hint, "type")?.to_string(),
        map_key: json::non_blank(hint, "mapKey").map(str::to_string),
        map_key_value: json::non_blank(hint, "mapKeyValue").map(str::to_string),
    })
}

/// Data set of a `Text` or `Dropdown` editor component
pub fn ui_data_set(node: &Object) -> Option<UiDataSet> {
    let component = editor_component(node)?;
    let name = json::string(component, "component")?;
    if name != "Text" && name != "Dropdown" {
        return None;
    }
    Some(UiDataSet {
        component: name.to_string(),
        data_set: json::non_blank(component, "dataSet")?.to_string(),
    })
}

/// Color mode for `hytale.type` color hints
pub fn color_mode(node: &Object) -> Option<&'static str> {
    match hytale_type(node)? {
        "Color" => Some("color"),
        "ColorAlpha" => Some("colorAlpha"),
        "ColorShort" => Some("colorLight"),
        _ => None,
    }
}

/// Discriminator declared on an object node (not a property node)
pub fn type_field(node: &Object) -> Option<TypeField> {
    let hint = json::object(node, "hytaleSchemaTypeField")?;
    let values = json::string_list(hint.get("values"));
    if values.is_empty() {
        return None;
    }
    Some(TypeField {
        property: json::non_blank(hint, "property")?.to_string(),
        values,
        default_value: json::string(hint, "defaultValue").map(str::to_string),
        parent_property_key: json::string(hint, "parentPropertyKey").map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: Value) -> Object {
        match value {
            Value::Object(object) => object,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_value_shape_inference() {
        assert_eq!(value_shape(&node(json!({ "type": "integer" })), ValueShape::String), ValueShape::Integer);
        assert_eq!(
            value_shape(&node(json!({ "type": ["null", "object", "string"] })), ValueShape::String),
            ValueShape::StringOrObject
        );
        assert_eq!(value_shape(&node(json!({ "type": ["null", "number"] })), ValueShape::String), ValueShape::Null);
        assert_eq!(value_shape(&node(json!({ "type": "weird" })), ValueShape::Number), ValueShape::Number);
        assert_eq!(value_shape(&node(json!({})), ValueShape::String), ValueShape::String);
    }

    #[test]
    fn test_contained_asset_type_requires_string_or_ref_union() {
        let matching = node(json!({
            "anyOf": [
                { "type": "null" },
                { "hytaleAssetRef": "Density", "anyOf": [ { "type": "string" }, { "$ref": "#/definitions/Density" } ] }
            ]
        }));
        assert_eq!(contained_asset_type(&matching), Some("Density"));

        let without_ref = node(json!({
            "anyOf": [ { "hytaleAssetRef": "Density", "anyOf": [ { "type": "string" } ] } ]
        }));
        assert_eq!(contained_asset_type(&without_ref), None);
    }

    #[test]
    fn test_parent_domain_requires_type() {
        let hint = node(json!({ "hytaleParent": { "type": "Item", "mapKey": "Id", "mapKeyValue": " " } }));
        let parent = parent_domain(&hint).unwrap();
        assert_eq!(parent.domain, "Item");
        assert_eq!(parent.map_key.as_deref(), Some("Id"));
        assert_eq!(parent.map_key_value, None);

        assert!(parent_domain(&node(json!({ "hytaleParent": { "mapKey": "Id" } }))).is_none());
    }

    #[test]
    fn test_ui_data_set_components() {
        let text = node(json!({ "hytale": { "uiEditorComponent": { "component": "Text", "dataSet": "BlockGroups" } } }));
        assert_eq!(
            ui_data_set(&text),
            Some(UiDataSet { component: "Text".into(), data_set: "BlockGroups".into() })
        );
        let slider = node(json!({ "hytale": { "uiEditorComponent": { "component": "Slider", "dataSet": "X" } } }));
        assert_eq!(ui_data_set(&slider), None);
    }

    #[test]
    fn test_type_field_needs_values() {
        let hint = node(json!({ "hytaleSchemaTypeField": { "property": "Type", "values": [] } }));
        assert!(type_field(&hint).is_none());
    }
}
