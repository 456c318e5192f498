use katex::{OptsBuilder, OutputType};

use crate::render::RenderError;

/// Renders a TeX expression to HTML, inline (`<span>`) or display (`<span class="katex-display">`).
pub fn render_math(literal: &str, display_mode: bool) -> Result<String, RenderError> {
    let mut builder = OptsBuilder::default();
    builder.display_mode(display_mode);
    builder.output_type(OutputType::Html);

    let opts = builder.build().map_err(|err| RenderError::Math {
        expression: literal.to_string(),
        message: format!("failed to build KaTeX options: {}", err),
    })?;

    katex::render_with_opts(literal, opts).map_err(|err| RenderError::Math {
        expression: literal.to_string(),
        message: err.to_string(),
    })
}
