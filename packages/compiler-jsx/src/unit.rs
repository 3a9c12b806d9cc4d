use crate::compiler::compile_markup;
use crate::context::CompileOptions;
use crate::error::CompileResult;
use serde::Serialize;
use tracing::instrument;

/// Executable text for one transform pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledUnit {
    pub executable_text: String,
    pub default_binding: Option<String>,
}

/// Statement assigning the default export slot from `name`, skipped when
/// `name` was never declared
pub fn default_export_postamble(name: &str, options: &CompileOptions) -> String {
    format!(
        "\nif (typeof {name} !== \"undefined\") {{ {exports}.default = {name}; }}\n",
        name = name,
        exports = options.exports_name
    )
}

/// Compile rewritten text and append the default export postamble
#[instrument(skip(text, options), fields(len = text.len()))]
pub fn compile_unit(text: &str, default_binding: Option<&str>, options: &CompileOptions) -> CompileResult<CompiledUnit> {
    let mut executable_text = compile_markup(text, options)?;
    if let Some(name) = default_binding {
        executable_text.push_str(&default_export_postamble(name, options));
    }
    Ok(CompiledUnit {
        executable_text,
        default_binding: default_binding.map(str::to_string),
    })
}
