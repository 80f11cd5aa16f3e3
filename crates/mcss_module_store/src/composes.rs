//! Local class scoping and `composes:` declarations.

use lightningcss::printer::PrinterOptions;
use lightningcss::properties::Property;
use lightningcss::rules::style::StyleRule;
use lightningcss::selector::Component;
use lightningcss::selector::Selector;
use lightningcss::values::ident::Ident;
use mcss_core::stylesheet::walk_style_rules;
use mcss_core::stylesheet::Stylesheet;
use mcss_core::value_parser::tokenize;
use mcss_core::value_parser::ValueToken;

const COMPOSES_PROPERTY: &str = "composes";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComposesSource {
  /// Classes declared in the same stylesheet
  Local,
  /// Unscoped class names, written as `from global`
  Global,
  /// Classes of another stylesheet, as referenced after `from`
  File(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Composes {
  /// Local classes of the rule the declaration was written in
  pub targets: Vec<String>,
  pub names: Vec<String>,
  pub source: ComposesSource,
}

/// Call `visit` with every class of `selector`, including classes inside `:not()`, `:is()`,
/// `:where()` and `:has()`
fn visit_classes<'i, F>(selector: &mut Selector<'i>, visit: &mut F)
where
  F: FnMut(&mut Ident<'i>),
{
  for component in selector.iter_mut_raw_match_order() {
    match component {
      Component::Class(class) => visit(class),
      Component::Negation(selectors)
      | Component::Is(selectors)
      | Component::Where(selectors)
      | Component::Has(selectors) => {
        for selector in selectors.iter_mut() {
          visit_classes(selector, visit);
        }
      }
      _ => {}
    }
  }
}

/// Class names of the selectors of `rule`, without duplicates
pub fn local_classes(rule: &mut StyleRule<'_>) -> Vec<String> {
  let mut classes: Vec<String> = Vec::new();

  for selector in rule.selectors.0.iter_mut() {
    visit_classes(selector, &mut |class| {
      let class = class.to_string();
      if !classes.contains(&class) {
        classes.push(class);
      }
    });
  }

  classes
}

/// Rename every class in the selectors of `rule`
pub fn scope_rule<F>(rule: &mut StyleRule<'_>, scoped_name: &mut F)
where
  F: FnMut(&str) -> String,
{
  for selector in rule.selectors.0.iter_mut() {
    visit_classes(selector, &mut |class| {
      *class = scoped_name(&**class).into();
    });
  }
}

/// Remove every `composes` declaration from the rules of `stylesheet` and return them.
///
/// Declarations that cannot be parsed, or that sit in a rule without a class, are returned as
/// `Err` with their value.
pub fn extract_composes(
  stylesheet: &mut Stylesheet,
) -> anyhow::Result<Vec<Result<Composes, String>>> {
  let mut composes = Vec::new();

  stylesheet.edit_chunks(|_, stylesheet| {
    walk_style_rules(&mut stylesheet.rules, &mut |rule| {
      let targets = local_classes(rule);
      let declarations = &mut rule.declarations;

      for properties in [
        &mut declarations.declarations,
        &mut declarations.important_declarations,
      ] {
        properties.retain(|property| {
          if !is_composes(property) {
            return true;
          }

          let value = property
            .value_to_css_string(PrinterOptions::default())
            .unwrap_or_default();

          composes.push(
            parse_composes(&value)
              .filter(|_| !targets.is_empty())
              .map(|(names, source)| Composes {
                targets: targets.clone(),
                names,
                source,
              })
              .ok_or(value),
          );

          false
        });
      }
    });

    Ok(())
  })?;

  Ok(composes)
}

fn is_composes(property: &Property<'_>) -> bool {
  property
    .property_id()
    .name()
    .eq_ignore_ascii_case(COMPOSES_PROPERTY)
}

/// Parse `a b`, `a b from "./other"` or `a from global`
fn parse_composes(value: &str) -> Option<(Vec<String>, ComposesSource)> {
  let mut tokens = tokenize(value).into_iter();
  let mut names = Vec::new();
  let mut source = ComposesSource::Local;

  while let Some(token) = tokens.next() {
    match token {
      ValueToken::Word(word) if word == "from" => {
        source = match tokens.next()? {
          ValueToken::Word(word) if word == "global" => ComposesSource::Global,
          ValueToken::String(reference) => ComposesSource::File(reference),
          _ => return None,
        };

        if tokens.next().is_some() {
          return None;
        }
      }
      ValueToken::Word(word) => names.push(word),
      _ => return None,
    }
  }

  if names.is_empty() {
    return None;
  }

  Some((names, source))
}

#[cfg(test)]
mod tests {
  use mcss_core::stylesheet::StyleChunk;
  use pretty_assertions::assert_eq;

  use super::*;

  fn stylesheet(code: &str) -> Stylesheet {
    Stylesheet::parse("/a.mcss", code).unwrap()
  }

  fn rule_classes(code: &str) -> Vec<Vec<String>> {
    let mut chunk = StyleChunk::parse(None, code).unwrap();
    let mut classes = Vec::new();

    chunk
      .edit(|stylesheet| {
        walk_style_rules(&mut stylesheet.rules, &mut |rule| {
          let mut found = local_classes(rule);
          found.sort();
          classes.push(found);
        });
        Ok(())
      })
      .unwrap();

    classes
  }

  #[test]
  fn finds_local_classes() {
    assert_eq!(
      rule_classes(".a .b:hover > .a, .c-1.-d, div#e { top: 0; } .f:not(.g) { top: 0; }"),
      vec![
        vec![
          String::from("-d"),
          String::from("a"),
          String::from("b"),
          String::from("c-1")
        ],
        vec![String::from("f"), String::from("g")],
      ]
    );
  }

  #[test]
  fn scopes_every_class() {
    let mut stylesheet = stylesheet(".a .b:hover > .a, div { top: 0; }");

    stylesheet
      .edit_chunks(|_, stylesheet| {
        walk_style_rules(&mut stylesheet.rules, &mut |rule| {
          scope_rule(rule, &mut |class| format!("x-{class}"));
        });
        Ok(())
      })
      .unwrap();

    assert_eq!(
      stylesheet.to_css(true).unwrap(),
      ".x-a .x-b:hover>.x-a,div{top:0}"
    );
  }

  #[test]
  fn parses_composes_values() {
    assert_eq!(
      parse_composes("a b"),
      Some((vec![String::from("a"), String::from("b")], ComposesSource::Local))
    );
    assert_eq!(
      parse_composes("a from \"./b\""),
      Some((vec![String::from("a")], ComposesSource::File(String::from("./b"))))
    );
    assert_eq!(
      parse_composes("a from global"),
      Some((vec![String::from("a")], ComposesSource::Global))
    );
    assert_eq!(parse_composes("from \"./b\""), None);
    assert_eq!(parse_composes("a from"), None);
    assert_eq!(parse_composes("a from \"./b\" c"), None);
    assert_eq!(parse_composes("a 1px"), None);
  }

  #[test]
  fn extracts_composes_declarations() {
    let mut stylesheet =
      stylesheet(".a { composes: b from \"./b\"; color: red; }\ndiv { composes: c; }");

    let composes = extract_composes(&mut stylesheet).unwrap();

    assert_eq!(
      composes,
      vec![
        Ok(Composes {
          targets: vec![String::from("a")],
          names: vec![String::from("b")],
          source: ComposesSource::File(String::from("./b")),
        }),
        Err(String::from("c")),
      ]
    );
    assert_eq!(stylesheet.to_css(true).unwrap(), ".a{color:red}");
  }
}
