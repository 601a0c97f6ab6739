use std::fs;

use crosswind_core::{ContentSource, CrosswindConfig, DarkMode, RuleConfig};
use crosswind_scanner::scan;
use crosswind_utilities::{generate_stylesheet, Assembler, Resolver, RuleTable, Theme};
use pretty_assertions::assert_eq;

fn resolver() -> Resolver {
    Resolver::new(Theme::default(), RuleTable::builtin(), DarkMode::Class)
}

#[test]
fn test_button_markup_yields_three_rules() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("index.html"),
        r#"<button class="bg-primary hover:bg-secondary p-4">Go</button>"#,
    )
    .unwrap();

    let report = scan(&[ContentSource::new(dir.path(), "./index.html")]);
    let resolver = resolver();
    let rules = resolver.resolve_all(&report.tokens);

    let mut tokens: Vec<_> = rules.iter().map(|r| r.token.as_str()).collect();
    tokens.sort();
    assert_eq!(tokens, vec!["bg-primary", "hover:bg-secondary", "p-4"]);

    let wrapped: Vec<_> = rules
        .iter()
        .filter(|r| r.sort_key.variant_rank > 0)
        .collect();
    assert_eq!(wrapped.len(), 1);
    assert_eq!(wrapped[0].selector, ".hover\\:bg-secondary:hover");

    let sheet = Assembler::new(resolver.theme())
        .with_preflight(false)
        .assemble(&rules);
    assert_eq!(
        sheet.to_css(),
        "\
.p-4 {
  padding: 1rem;
}

.bg-primary {
  background-color: hsl(var(--primary));
}

.hover\\:bg-secondary:hover {
  background-color: hsl(var(--secondary));
}
"
    );
}

#[test]
fn test_output_is_byte_identical() {
    let tokens: Vec<String> = [
        "md:flex",
        "dark:bg-background",
        "w-1/2",
        "animate-fade-in",
        "container",
        "-mt-2",
        "data-[state=open]:bg-accent",
        "text-muted-foreground",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let mut reversed = tokens.clone();
    reversed.reverse();

    let config = CrosswindConfig::default();
    let first = generate_stylesheet(&config, &tokens).unwrap().to_css();
    let second = generate_stylesheet(&config, &reversed).unwrap().to_css();
    assert_eq!(first, second);
    assert!(first.starts_with("*, ::before, ::after {"));
    assert_eq!(first.matches("@keyframes fade-in").count(), 1);
}

#[test]
fn test_unmatched_tokens_are_dropped_silently() {
    let tokens: Vec<String> = ["useState", "hello", "p-13", "3xl:p-4", "const"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rules = resolver().resolve_all(&tokens);
    assert!(rules.is_empty());
}

#[test]
fn test_user_rule_from_config() {
    let mut config = CrosswindConfig::default();
    config.rules.push(RuleConfig {
        pattern: "bg-{color}".to_string(),
        declarations: vec!["background-color: var(--{color})".to_string()],
        negatable: false,
    });
    let tokens = vec!["bg-brand".to_string()];
    let css = generate_stylesheet(&config, &tokens).unwrap().utilities;
    assert_eq!(css, ".bg-brand {\n  background-color: var(--brand);\n}\n");
}

#[test]
fn test_inject_into_entry_stylesheet() {
    let tokens = vec!["p-4".to_string()];
    let mut config = CrosswindConfig::default();
    config.build.preflight = false;
    let sheet = generate_stylesheet(&config, &tokens).unwrap();

    let css = sheet.inject_into("@tailwind base;\n@tailwind components;\n@tailwind utilities;\n");
    assert_eq!(css, "\n\n.p-4 {\n  padding: 1rem;\n}\n");
}
