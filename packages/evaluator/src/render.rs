//! Single-pass preview rendering of a component into a virtual DOM.
//!
//! There is no reconciliation and no state: every render calls each
//! component once with its props and flattens the result. Hooks supplied by
//! the `react` capability are written for exactly this model.

use crate::builtins::json;
use crate::error::{EvalError, EvalResult};
use crate::execute::Component;
use crate::interpreter::Interpreter;
use crate::value::{Element, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Virtual DOM node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VNode {
    /// Intrinsic element such as `div`
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        /// Inline style as a CSS declaration list
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<String>,
        /// Names of event-handler props that were dropped
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        events: Vec<String>,
        children: Vec<VNode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },

    /// Text node
    Text { content: String },

    /// Component drawn by the display surface itself (diagram widgets)
    Host {
        name: String,
        props: serde_json::Value,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<VNode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
}

impl VNode {
    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text {
            content: content.into(),
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element { tag, .. } => Some(tag),
            VNode::Host { name, .. } => Some(name),
            VNode::Text { .. } => None,
        }
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element { children, .. } | VNode::Host { children, .. } => children,
            VNode::Text { .. } => &[],
        }
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        match self {
            VNode::Text { content } => content.clone(),
            _ => self.children().iter().map(VNode::text_content).collect(),
        }
    }
}

/// Props from a JSON object, for hosts that hold props as JSON
pub fn props_from_json(props: &serde_json::Value) -> Value {
    json::from_json(props)
}

/// Render `component` with `props` in the realm it was executed in
#[instrument(skip_all, fields(component = %component.name()))]
pub fn render_component(component: &Component, props: Value) -> EvalResult<Vec<VNode>> {
    let props = if props.is_nullish() { Value::empty_object() } else { props };
    let mut renderer = Renderer {
        interp: Interpreter::new(component.realm().clone()),
        depth: 0,
    };
    let nodes = renderer.render_type(component.value(), props, None)?;
    debug!(roots = nodes.len(), "rendered");
    Ok(nodes)
}

struct Renderer {
    interp: Interpreter,
    /// Nesting of components currently being rendered
    depth: usize,
}

impl Renderer {
    fn render_value(&mut self, value: &Value) -> EvalResult<Vec<VNode>> {
        self.interp.check_stack()?;
        match value {
            Value::Undefined | Value::Null | Value::Bool(_) => Ok(Vec::new()),
            Value::Number(_) | Value::String(_) => Ok(vec![VNode::text(value.to_display_string())]),
            Value::Array(items) => {
                let items = items.borrow().clone();
                let mut nodes = Vec::new();
                for item in &items {
                    nodes.extend(self.render_value(item)?);
                }
                Ok(nodes)
            }
            Value::Element(element) => self.render_element(element),
            Value::Function(_) => Ok(Vec::new()),
            Value::Object(_) => {
                let keys = self.interp.own_keys(value).join(", ");
                Err(EvalError::type_error(format!(
                    "Objects are not valid as a React child (found: object with keys {{{}}})",
                    keys
                )))
            }
        }
    }

    fn render_element(&mut self, element: &Element) -> EvalResult<Vec<VNode>> {
        self.render_type(&element.element_type, element.props.clone(), element.key.clone())
    }

    fn render_type(&mut self, element_type: &Value, props: Value, key: Option<String>) -> EvalResult<Vec<VNode>> {
        match element_type {
            Value::String(tag) => Ok(vec![self.render_intrinsic(tag, &props, key)?]),
            Value::Function(function) => {
                if function.is_host() {
                    return Ok(vec![self.render_host(&function.name, &props, key)?]);
                }
                if self.depth >= self.interp.realm().options.max_call_depth {
                    return Err(EvalError::range("Maximum call stack size exceeded"));
                }
                self.depth += 1;
                let result = self.render_function(element_type, props);
                self.depth -= 1;
                result
            }
            other => Err(EvalError::type_error(format!(
                "Element type is invalid: expected a string or a function but got: {}",
                other.inspect()
            ))),
        }
    }

    fn render_function(&mut self, component: &Value, props: Value) -> EvalResult<Vec<VNode>> {
        let output = if component.as_function().is_some_and(|f| f.is_class()) {
            let instance = self.interp.construct(component, vec![props.clone()])?;
            if self.interp.get_property(&instance, "props")?.is_undefined() {
                self.interp.set_property(&instance, "props", props)?;
            }
            let render = self.interp.get_property(&instance, "render")?;
            if !render.is_callable() {
                return Err(EvalError::type_error(format!(
                    "{} has no render method",
                    component.inspect()
                )));
            }
            self.interp.call_function(&render, instance, Vec::new())?
        } else {
            self.interp.call_function(component, Value::Undefined, vec![props])?
        };
        self.render_value(&output)
    }

    fn render_intrinsic(&mut self, tag: &str, props: &Value, key: Option<String>) -> EvalResult<VNode> {
        let mut attributes = IndexMap::new();
        let mut style = None;
        let mut events = Vec::new();
        for name in self.interp.own_keys(props) {
            let value = self.interp.get_property(props, &name)?;
            match name.as_str() {
                "children" | "key" | "ref" => {}
                "style" => style = self.style_text(&value)?,
                _ if value.is_callable() => events.push(name),
                _ => {
                    let Some(text) = attribute_text(&mut self.interp, &value)? else {
                        continue;
                    };
                    let name = match name.as_str() {
                        "className" => "class".to_string(),
                        "htmlFor" => "for".to_string(),
                        _ => name,
                    };
                    attributes.insert(name, text);
                }
            }
        }
        let children = self.render_children(props)?;
        Ok(VNode::Element {
            tag: tag.to_string(),
            attributes,
            style,
            events,
            children,
            key,
        })
    }

    fn render_host(&mut self, name: &str, props: &Value, key: Option<String>) -> EvalResult<VNode> {
        let mut json_props = serde_json::Map::new();
        for prop in self.interp.own_keys(props) {
            if matches!(prop.as_str(), "children" | "key" | "ref") {
                continue;
            }
            let value = self.interp.get_property(props, &prop)?;
            if let Some(json) = json::to_json(&mut self.interp, &value)? {
                json_props.insert(prop, json);
            }
        }
        let children = self.render_children(props)?;
        Ok(VNode::Host {
            name: name.to_string(),
            props: serde_json::Value::Object(json_props),
            children,
            key,
        })
    }

    fn render_children(&mut self, props: &Value) -> EvalResult<Vec<VNode>> {
        if props.is_nullish() {
            return Ok(Vec::new());
        }
        let children = self.interp.get_property(props, "children")?;
        self.render_value(&children)
    }

    fn style_text(&mut self, style: &Value) -> EvalResult<Option<String>> {
        match style {
            Value::Object(_) => {}
            Value::String(text) => return Ok(Some(text.to_string())),
            _ => return Ok(None),
        }
        let mut declarations = Vec::new();
        for property in self.interp.own_keys(style) {
            let value = self.interp.get_property(style, &property)?;
            let text = match &value {
                Value::Undefined | Value::Null | Value::Bool(_) => continue,
                Value::Number(n) if *n != 0.0 && !is_unitless(&property) => {
                    format!("{}px", value.to_display_string())
                }
                _ => self.interp.to_string_value(&value)?,
            };
            declarations.push(format!("{}: {}", kebab_case(&property), text));
        }
        Ok(if declarations.is_empty() {
            None
        } else {
            Some(declarations.join("; "))
        })
    }
}

/// Attribute text, or `None` when the attribute is omitted
fn attribute_text(interp: &mut Interpreter, value: &Value) -> EvalResult<Option<String>> {
    Ok(match value {
        Value::Undefined | Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some(String::new()),
        other => Some(interp.to_string_value(other)?),
    })
}

/// `backgroundColor` -> `background-color`, `WebkitTransition` ->
/// `-webkit-transition`; custom properties pass through
fn kebab_case(property: &str) -> String {
    if property.starts_with("--") {
        return property.to_string();
    }
    let mut out = String::with_capacity(property.len() + 4);
    for (i, c) in property.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 || property.starts_with(|c: char| c.is_ascii_uppercase()) {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn is_unitless(property: &str) -> bool {
    matches!(
        property,
        "animationIterationCount"
            | "aspectRatio"
            | "columnCount"
            | "columns"
            | "flex"
            | "flexGrow"
            | "flexShrink"
            | "fontWeight"
            | "gridArea"
            | "gridColumn"
            | "gridColumnEnd"
            | "gridColumnStart"
            | "gridRow"
            | "gridRowEnd"
            | "gridRowStart"
            | "lineClamp"
            | "lineHeight"
            | "opacity"
            | "order"
            | "orphans"
            | "scale"
            | "tabSize"
            | "widows"
            | "zIndex"
            | "zoom"
            | "fillOpacity"
            | "strokeOpacity"
            | "strokeWidth"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case() {
        assert_eq!(kebab_case("backgroundColor"), "background-color");
        assert_eq!(kebab_case("WebkitTransition"), "-webkit-transition");
        assert_eq!(kebab_case("--accent"), "--accent");
        assert_eq!(kebab_case("color"), "color");
    }

    #[test]
    fn test_text_content_concatenates() {
        let node = VNode::Element {
            tag: "p".to_string(),
            attributes: IndexMap::new(),
            style: None,
            events: Vec::new(),
            children: vec![VNode::text("a"), VNode::text("b")],
            key: None,
        };
        assert_eq!(node.text_content(), "ab");
        assert_eq!(node.tag(), Some("p"));
    }
}
