use crosswind_parse::{parse_candidate, Utility};
use pretty_assertions::assert_eq;

/// 真实组件中常见的 token 都应能解析
#[test]
fn test_parse_component_tokens() {
    let tokens = [
        "inline-flex",
        "items-center",
        "rounded-md",
        "text-sm",
        "ring-offset-background",
        "focus-visible:outline-none",
        "focus-visible:ring-2",
        "disabled:pointer-events-none",
        "disabled:opacity-50",
        "hover:bg-primary/90",
        "data-[state=open]:animate-accordion-down",
        "group-data-[collapsible=icon]:hidden",
        "[&_svg]:size-4",
        "peer-disabled:cursor-not-allowed",
        "sm:max-w-[425px]",
        "md:hover:-translate-y-1",
        "w-1/2",
        "!mt-0",
        "[mask-type:luminance]",
    ];

    let failed: Vec<String> = tokens
        .iter()
        .filter_map(|token| match parse_candidate(token) {
            Ok(parsed) if parsed.raw == *token => None,
            Ok(parsed) => Some(format!("{}: raw became {}", token, parsed.raw)),
            Err(err) => Some(format!("{}: {}", token, err)),
        })
        .collect();

    assert_eq!(failed, Vec::<String>::new());
}

#[test]
fn test_group_data_variant() {
    let parsed = parse_candidate("group-data-[collapsible=icon]:hidden").unwrap();

    assert_eq!(parsed.variants[0].name, "group-data");
    assert_eq!(
        parsed.variants[0].arbitrary.as_ref().unwrap().content,
        "collapsible=icon"
    );
    assert_eq!(
        parsed.utility,
        Utility::Named {
            body: "hidden".to_string(),
            arbitrary: None,
            alpha: None,
        }
    );
}

#[test]
fn test_garbage_is_rejected() {
    for token in ["", ":", "a::b", "]x[", "w-[3px]]"] {
        assert!(parse_candidate(token).is_err(), "{} should fail", token);
    }
}
