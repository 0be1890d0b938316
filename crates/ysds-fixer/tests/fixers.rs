//! Whole-file fixtures run through the registry

use std::collections::HashMap;

use ysds_fixer::config::parse_php_cs_fixer_config;
use ysds_fixer::{ConfigValue, FixerConfig, FixerRegistry};

/// Fix `source` with every rule and check that a second run is a no-op
fn fix_all(source: &str) -> String {
    let registry = FixerRegistry::new();
    let (fixed, _) = registry.check_all(source).unwrap();

    let (again, edits) = registry.check_all(&fixed).unwrap();
    assert_eq!(again, fixed);
    assert!(edits.is_empty(), "second run changed:\n{fixed}");

    fixed
}

#[test]
fn test_test_case_fixture() {
    let source = r#"<?php

namespace App\Tests;

use PHPUnit\Framework\TestCase;

final class ColorTest extends TestCase
{
    public function testColors(): void
    {
        $this->assertEquals('red', color());
        $this->assertEquals($expected, color());
        $this->assertEquals(['a', 'b'], colors());
    }
}
"#;
    let expected = r#"<?php

namespace App\Tests;

use PHPUnit\Framework\TestCase;

final class ColorTest extends TestCase
{
    public function testColors(): void
    {
        $this->assertSame('red', color());
        $this->assertEquals($expected, color());
        $this->assertSame(['a', 'b'], colors());
    }
}
"#;
    assert_eq!(fix_all(source), expected);
}

#[test]
fn test_sorting_and_unread_variable_fixture() {
    let source = "<?php\nfunction yee() {\n    $unused = ['b', 'a'];\n    $used = [\n        'z' => 1,\n        'y' => 2,\n    ];\n    return $used;\n}\n";
    let expected = "<?php\nfunction yee() {\n    /* FIXME: Variable assigned but never read. */\n    $unused = ['a', 'b'];\n    $used = [\n        'y' => 2,\n        'z' => 1,\n    ];\n    return $used;\n}\n";

    let registry = FixerRegistry::new();
    let (fixed, edits) = registry.check_all(source).unwrap();
    assert_eq!(fixed, expected);

    let rules: Vec<&str> = edits.iter().filter_map(|e| e.rule.as_deref()).collect();
    assert_eq!(
        rules,
        vec!["YSDS/ordered_array", "YSDS/ordered_array_keys", "YSDS/variable_never_read"]
    );

    assert_eq!(fix_all(source), expected);
}

#[test]
fn test_banned_type_gets_one_comment() {
    let registry = FixerRegistry::new();
    let mut configs = HashMap::new();
    configs.insert(
        "YSDS/ban_types".to_string(),
        FixerConfig::new().with_option("types", ConfigValue::List(vec![ConfigValue::String("\\App\\Car".into())])),
    );

    let (fixed, edits) = registry
        .check("<?php\nnew App\\Car();\n", &["YSDS/ban_types"], &configs)
        .unwrap();
    assert_eq!(fixed, "<?php\nnew App\\Car(); /* FIXME: This type is banned. */\n");
    assert_eq!(edits.len(), 1);

    let (again, edits) = registry.check(&fixed, &["YSDS/ban_types"], &configs).unwrap();
    assert_eq!(again, fixed);
    assert!(edits.is_empty());
}

#[test]
fn test_rules_from_php_cs_fixer_config() {
    let config = parse_php_cs_fixer_config(
        r#"<?php
return (new PhpCsFixer\Config())
    ->setRules([
        '@PSR2' => true,
        'YSDS/replace_strings' => [
            'replacements' => ['yee' => 'boi'],
        ],
        'YSDS/ordered_array' => [
            'filter' => [['invocation', 'equal', 'sortMe']],
        ],
    ]);
"#,
    )
    .unwrap();

    let rules = config.enabled_rules("YSDS/");
    assert_eq!(rules, vec!["YSDS/ordered_array", "YSDS/replace_strings"]);

    let registry = FixerRegistry::new();
    let source = "<?php\necho 'yee!';\nsortMe([3, 1, 2]);\nkeep([3, 1, 2]);\n";
    let (fixed, _) = registry.check(source, &rules, &config.fixer_configs()).unwrap();

    assert_eq!(fixed, "<?php\necho 'boi!';\nsortMe([1, 2, 3]);\nkeep([3, 1, 2]);\n");
}
