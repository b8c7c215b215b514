#[cfg(test)]
mod tests {
    use glaze::config::RenderOptions;
    use glaze::error::Error;
    use glaze::renderer::{GlazeRenderer, TemplateRenderer};
    use serde_json::{json, Value};
    use test_log::test;

    fn test_template(template: &str, context: Value, expected: &str) {
        let renderer = GlazeRenderer::new();
        let result = renderer.render(template, &context).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_literal_text_is_unchanged() {
        test_template("Dear customer,\n  thank you.\n", json!({"x": 1}), "Dear customer,\n  thank you.\n");
    }

    #[test]
    fn test_greeting() {
        test_template("Hello {{name}}!", json!({"name": "World"}), "Hello World!");
    }

    #[test]
    fn test_nested_paths_and_indices() {
        test_template(
            "{{order.customer.name}} bought {{order.items.1}}",
            json!({"order": {"customer": {"name": "Ada"}, "items": ["pen", "ink"]}}),
            "Ada bought ink",
        );
    }

    #[test]
    fn test_camel_case_helper() {
        test_template("{{camel_case 'hello world'}}", json!({}), "helloWorld");
    }

    #[test]
    fn test_kebab_case_helper() {
        test_template("{{kebab_case('hello world')}}", json!({}), "hello-world");
    }

    #[test]
    fn test_pascal_case_helper() {
        test_template("{{pascal_case \"hello world\"}}", json!({}), "HelloWorld");
    }

    #[test]
    fn test_screaming_snake_case_helper() {
        test_template("{{screaming_snake_case 'hello world'}}", json!({}), "HELLO_WORLD");
    }

    #[test]
    fn test_snake_case_helper() {
        test_template("{{snake_case name}}", json!({"name": "hello world"}), "hello_world");
    }

    #[test]
    fn test_table_case_helper() {
        test_template("{{table_case 'Hello World'}}", json!({}), "hello_worlds");
    }

    #[test]
    fn test_train_case_helper() {
        test_template("{{train_case 'hello world'}}", json!({}), "Hello-World");
    }

    #[test]
    fn test_plural_and_singular_helpers() {
        test_template("{{plural 'car'}} {{singular 'cars'}}", json!({}), "cars car");
    }

    #[test]
    fn test_foreign_key_helper() {
        test_template("{{foreign_key 'Message'}}", json!({}), "message_id");
    }

    #[test]
    fn test_regex_helper() {
        test_template(
            "{{#if regex(email \"^[a-z]+@[a-z]+\\.com$\")}}valid{{else}}invalid{{/if}}",
            json!({"email": "ada@example.com"}),
            "valid",
        );
        test_template("{{regex 'abc' '['}}", json!({}), "false");
    }

    #[test]
    fn test_arithmetic_composition() {
        test_template("{{add(multiply(2 3) 4)}}", json!({}), "10");
        test_template("{{subtract (divide total count) 1}}", json!({"total": 9, "count": 2}), "3.5");
        test_template("{{modulo 10 4}}", json!({}), "2");
    }

    #[test]
    fn test_large_integers_stay_exact() {
        test_template("{{add big 0}}", json!({"big": 9007199254740993_i64}), "9007199254740993");
        test_template("{{multiply 3000000000 3}}", json!({}), "9000000000");
    }

    #[test]
    fn test_non_finite_arithmetic_is_an_error() {
        let renderer = GlazeRenderer::new();
        let err = renderer.render("{{multiply 1e308 10}}", &json!({})).unwrap_err();
        assert!(matches!(err, Error::HelperExecution { ref name, .. } if name == "multiply"));
    }

    #[test]
    fn test_call_followed_by_arguments() {
        test_template("{{concat(1 2) 3}}", json!({}), "(1 2)3");
        let renderer = GlazeRenderer::new();
        let err = renderer.render("{{add(1 2) 3}}", &json!({})).unwrap_err();
        assert!(matches!(err, Error::HelperExecution { ref name, .. } if name == "add"));
    }

    #[test]
    fn test_collection_helpers() {
        let context = json!({"tags": ["a", "b", "c"]});
        test_template("{{length tags}} {{first tags}} {{last tags}}", context.clone(), "3 a c");
        test_template("{{join tags \" | \"}}", context, "a | b | c");
    }

    #[test]
    fn test_each_list() {
        test_template("{{#each items}}{{this}},{{/each}}", json!({"items": [1, 2, 3]}), "1,2,3,");
    }

    #[test]
    fn test_each_with_position_data() {
        test_template(
            "{{#each items}}{{#if @first}}[{{/if}}{{@index}}={{this}}{{#if @last}}]{{else}}, {{/if}}{{/each}}",
            json!({"items": ["x", "y", "z"]}),
            "[0=x, 1=y, 2=z]",
        );
    }

    #[test]
    fn test_each_over_object_keeps_insertion_order() {
        test_template(
            "{{#each env}}{{@key}}={{this}}\n{{/each}}",
            json!({"env": {"PORT": 80, "HOST": "localhost"}}),
            "PORT=80\nHOST=localhost\n",
        );
    }

    #[test]
    fn test_each_with_else() {
        let template = "{{#each items}}{{name}}{{else}}nothing{{/each}}";
        test_template(template, json!({"items": []}), "nothing");
        test_template(template, json!({}), "nothing");
        test_template(template, json!({"items": [{"name": "n"}]}), "n");
    }

    #[test]
    fn test_parent_and_root_access() {
        test_template(
            "{{#each users}}{{name}}@{{../domain}}/{{@root.env}};{{/each}}",
            json!({"users": [{"name": "a"}, {"name": "b"}], "domain": "x.io", "env": "prod"}),
            "a@x.io/prod;b@x.io/prod;",
        );
    }

    #[test]
    fn test_if_else_on_truthy_values() {
        for value in [json!(true), json!(1), json!(-2.5), json!("no"), json!([0]), json!({})] {
            test_template("{{#if v}}T{{else}}F{{/if}}", json!({"v": value}), "T");
        }
    }

    #[test]
    fn test_if_else_on_falsy_values() {
        for value in [json!(false), json!(0), json!(""), json!(null), json!([])] {
            test_template("{{#if v}}T{{else}}F{{/if}}", json!({"v": value}), "F");
        }
        test_template("{{#if v}}T{{else}}F{{/if}}", json!({}), "F");
    }

    #[test]
    fn test_nested_blocks() {
        test_template(
            "{{#each groups}}{{title}}:{{#each members}}{{#unless @first}},{{/unless}}{{this}}{{/each}};{{/each}}",
            json!({"groups": [{"title": "g1", "members": ["a", "b"]}, {"title": "g2", "members": []}]}),
            "g1:a,b;g2:;",
        );
    }

    #[test]
    fn test_with_changes_scope() {
        test_template(
            "{{#with address}}{{city}}, {{zip}}{{/with}}",
            json!({"address": {"city": "Paris", "zip": "75001"}}),
            "Paris, 75001",
        );
    }

    #[test]
    fn test_comments_are_dropped() {
        test_template("a{{! short }}b{{!-- long {{with}} braces --}}c", json!({}), "abc");
    }

    #[test]
    fn test_whitespace_control() {
        test_template("<ul>\n  {{~#each xs~}}\n  <li>{{this}}</li>\n  {{~/each~}}\n</ul>", json!({"xs": [1, 2]}), "<ul><li>1</li><li>2</li></ul>");
    }

    #[test]
    fn test_standalone_lines() {
        let renderer = GlazeRenderer::new().with_options(RenderOptions {
            trim_standalone: true,
            ..RenderOptions::default()
        });
        let template = "list:\n  {{#each xs}}\n  - {{this}}\n  {{/each}}\ndone\n";
        let out = renderer.render(template, &json!({"xs": ["a", "b"]})).unwrap();
        assert_eq!(out, "list:\n  - a\n  - b\ndone\n");
    }

    #[test]
    fn test_partials_with_context() {
        let mut renderer = GlazeRenderer::new();
        renderer.add_partial("user", "{{name}} <{{email}}>").unwrap();
        let out = renderer
            .render(
                "{{#each users}}{{> user}}\n{{/each}}{{> user admin}}",
                &json!({
                    "users": [{"name": "a", "email": "a@x"}],
                    "admin": {"name": "root", "email": "root@x"}
                }),
            )
            .unwrap();
        assert_eq!(out, "a <a@x>\nroot <root@x>");
    }

    #[test]
    fn test_missing_values_render_leniently() {
        test_template("[{{missing}}][{{a.b.c}}]", json!({"a": 1}), "[][]");
        test_template("{{uppercase missing.path}}", json!({}), "MISSING.PATH");
    }

    #[test]
    fn test_unterminated_block() {
        let renderer = GlazeRenderer::new();
        let err = renderer.render("{{#if x}}A", &json!({"x": true})).unwrap_err();
        assert!(matches!(err, Error::Parse { offset: 0, .. }));
    }

    #[test]
    fn test_unterminated_expression() {
        let renderer = GlazeRenderer::new();
        let err = renderer.render("line\n  {{name", &json!({})).unwrap_err();
        assert_eq!(err.line_col("line\n  {{name"), Some((2, 3)));
    }

    #[test]
    fn test_unknown_helper_is_named() {
        let renderer = GlazeRenderer::new();
        let err = renderer.render("{{nope 1 2}}", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Unknown helper 'nope'.");
    }

    #[test]
    fn test_helper_failure_keeps_source() {
        let mut renderer = GlazeRenderer::new();
        renderer.register_helper("fail", |_: &[Value]| anyhow::bail!("boom"));
        let err = renderer.render("{{fail}}", &json!({})).unwrap_err();
        match err {
            Error::HelperExecution { name, source } => {
                assert_eq!(name, "fail");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_twenty_levels_of_nesting() {
        let inner = (0..20).fold("1".to_string(), |acc, _| format!("add({acc} 1)"));
        test_template(&format!("{{{{{inner}}}}}"), json!({}), "21");
    }

    #[test]
    fn test_helper_registration_overrides_builtin() {
        let mut renderer = GlazeRenderer::new();
        renderer.register_helper("uppercase", |_: &[Value]| Ok(json!("custom")));
        assert_eq!(renderer.render("{{uppercase 'x'}}", &json!({})).unwrap(), "custom");
    }

    #[test]
    fn test_repeated_renders_are_identical() {
        let renderer = GlazeRenderer::new();
        let context = json!({"xs": [3, 1, 2]});
        let template = "{{#each xs}}{{multiply this 2}} {{/each}}";
        let first = renderer.render(template, &context).unwrap();
        assert_eq!(first, "6 2 4 ");
        for _ in 0..3 {
            assert_eq!(renderer.render(template, &context).unwrap(), first);
        }
    }

    #[test]
    fn test_execute_expression() {
        let renderer = GlazeRenderer::new();
        let context = json!({"use_docker": true, "count": 0, "lang": "rust"});
        assert!(renderer.execute_expression("use_docker", &context).unwrap());
        assert!(!renderer.execute_expression("count", &context).unwrap());
        assert!(renderer.execute_expression("eq lang 'rust'", &context).unwrap());
        assert!(renderer.execute_expression("and(use_docker not(count))", &context).unwrap());
        assert!(renderer.execute_expression("", &context).unwrap());
    }
}
