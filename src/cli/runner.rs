use crate::{
    cli::Args,
    config::Config,
    constants::STDIN_INDICATOR,
    error::{Error, Result},
    ioutils::{load_context, read_template, write_file},
    renderer::{GlazeRenderer, TemplateRenderer},
};
use log::{debug, error, info};
use std::io::Write;

/// Main CLI runner: loads configuration, template and context, then renders.
pub struct Runner {
    args: Args,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        Self { args }
    }

    /// Renders the template and writes the result to the selected output.
    pub fn run(self) -> Result<()> {
        if self.args.template == STDIN_INDICATOR
            && self.args.context.as_deref() == Some(STDIN_INDICATOR)
        {
            return Err(Error::ConfigValidation(
                "template and context cannot both be read from stdin".into(),
            ));
        }

        let renderer = self.build_renderer()?;
        let template = read_template(&self.args.template)?;
        let context = load_context(self.args.context.as_deref())?;

        let output = renderer.render(&template, &context).inspect_err(|err| {
            if let Some(location) =
                error_location(err, &renderer, &self.args.template, &template)
            {
                error!("{location}: {err}");
            }
        })?;

        match &self.args.output {
            Some(path) => {
                write_file(&output, path)?;
                info!("Rendered '{}' into '{}'", self.args.template, path.display());
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(output.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }

    fn build_renderer(&self) -> Result<GlazeRenderer> {
        let cwd = std::env::current_dir()?;
        let mut config = Config::load(self.args.config.as_deref(), &cwd)?;
        if self.args.trim_standalone {
            config.options.trim_standalone = true;
        }
        debug!("Render options: {:?}", config.options);
        Ok(GlazeRenderer::from_config(config))
    }
}

/// `source:line:column` of a parse error, resolved against the partial the
/// error came from or else the main template.
fn error_location(
    err: &Error,
    renderer: &GlazeRenderer,
    template_name: &str,
    template: &str,
) -> Option<String> {
    let (source_name, source) = match err.partial() {
        Some(name) => (format!("partial '{name}'"), renderer.partial(name)?),
        None => (template_name.to_string(), template),
    };
    let (line, column) = err.line_col(source)?;
    Some(format!("{source_name}:{line}:{column}"))
}

/// Entry point used by the binary.
pub fn run(args: Args) -> Result<()> {
    Runner::new(args).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn renders_template_file_into_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("page.hbs");
        let output = dir.path().join("out/page.txt");
        let config = dir.path().join("glaze.json");
        std::fs::write(&template, "{{> greet}} {{add n 1}}").unwrap();
        std::fs::write(&config, r#"{"partials": {"greet": "Hi {{name}}"}}"#).unwrap();

        let args = Args::parse_from([
            "glaze",
            template.to_str().unwrap(),
            "--context",
            r#"{"name": "Ada", "n": 41}"#,
            "--config",
            config.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ]);
        run(args).unwrap();
        assert_eq!(std::fs::read_to_string(output).unwrap(), "Hi Ada 42");
    }

    #[test]
    fn locates_parse_errors_in_their_own_source() {
        let mut renderer = GlazeRenderer::new();
        renderer.register_partial("row", "ok\n{{/each}}");
        let template = "header\n{{> row}}";

        let err = renderer.render(template, &serde_json::json!({})).unwrap_err();
        assert_eq!(
            error_location(&err, &renderer, "page.hbs", template).as_deref(),
            Some("partial 'row':2:1")
        );

        let err = renderer.render("a\nb {{#if x}}", &serde_json::json!({})).unwrap_err();
        assert_eq!(
            error_location(&err, &renderer, "page.hbs", "a\nb {{#if x}}").as_deref(),
            Some("page.hbs:2:3")
        );

        let err = Error::UnknownHelper { name: "nope".into() };
        assert_eq!(error_location(&err, &renderer, "page.hbs", template), None);
    }

    #[test]
    fn rejects_two_stdin_inputs() {
        let args = Args::parse_from(["glaze", "-", "--context", "-"]);
        assert!(matches!(run(args), Err(Error::ConfigValidation(_))));
    }

    #[test]
    fn reports_missing_template() {
        let args = Args::parse_from(["glaze", "/definitely/not/here.hbs"]);
        assert!(matches!(run(args), Err(Error::Io(_))));
    }
}
