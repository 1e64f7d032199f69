//! Render `{{ variable }}` placeholders in text templates.

use crate::Error;
use handlebars::Handlebars;
use std::collections::BTreeMap;

const TEMPLATE: &str = "template";

/// Create a Handlebars instance for plain-text output.
fn create_handlebars() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();

    // Rendered text is a shell script, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    // Referencing a missing variable is an error instead of an empty string
    handlebars.set_strict_mode(true);
    handlebars
}

/// Replace every `{{ variable }}` in `template` with its value in `variables`.
///
/// Referencing a variable that is not provided, or leaving a placeholder unterminated, is an
/// error.
pub fn render(template: &str, variables: &BTreeMap<&str, String>) -> Result<String, Error> {
    let mut handlebars = create_handlebars();
    handlebars
        .register_template_string(TEMPLATE, template)
        .map_err(|e| Error::Template(format!("invalid template: {e}")))?;
    handlebars
        .render(TEMPLATE, variables)
        .map_err(|e| Error::Template(format!("failed to render template: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variables() -> BTreeMap<&'static str, String> {
        BTreeMap::from([("cluster", "foo-cluster".to_string()), ("n", "1".to_string())])
    }

    #[test]
    fn test_render() {
        let rendered = render("ECS_CLUSTER={{cluster}} n={{ n }}{{n}}", &variables()).unwrap();
        assert_eq!(rendered, "ECS_CLUSTER=foo-cluster n=11");
    }

    #[test]
    fn test_render_raw() {
        assert_eq!(
            render("{{{cluster}}}", &variables()).unwrap(),
            "foo-cluster"
        );
    }

    #[test]
    fn test_render_without_placeholders() {
        assert_eq!(render("plain", &variables()).unwrap(), "plain");
        assert_eq!(render("", &BTreeMap::new()).unwrap(), "");
    }

    #[test]
    fn test_shell_not_escaped() {
        let variables = BTreeMap::from([("cluster", "a&b <c>".to_string())]);
        assert_eq!(
            render("echo {{cluster}} >> /etc/x", &variables).unwrap(),
            "echo a&b <c> >> /etc/x"
        );
    }

    #[test]
    fn test_unknown_variable() {
        assert!(matches!(
            render("{{missing}}", &variables()),
            Err(Error::Template(_))
        ));
    }

    #[test]
    fn test_unterminated() {
        assert!(matches!(
            render("x {{cluster", &variables()),
            Err(Error::Template(_))
        ));
    }

    #[test]
    fn test_value_not_rescanned() {
        let variables = BTreeMap::from([("a", "{{b}}".to_string())]);
        assert_eq!(render("{{a}}", &variables).unwrap(), "{{b}}");
    }
}
