pub const POST_DATA_YAML: &str = "---
title: Hello World
date: 2024-01-15
category: 개발
tags:
  - rust
  - markdown
excerpt: A first post
---

This is the first paragraph.

## A section

Some `inline code` and a [link](https://example.com).
";

pub const POST_DATA_LINK_HEADER: &str = "<!--
[ID]: # (21c1e9ad-4ebb-4168-a543-fbf77cc35a85)
[DATE]: # (2024-02-12 22:54:00.000)
[TAGS]: # (rust blog)
-->

# What I learned
How to be a great software engineer?
";

pub const POST_DATA_RICH: &str = r#"# Rendering check

| Name | Value |
|:-----|------:|
| one  | 1     |

```rust
fn main() {
    let answer = 42; // the answer
    println!("{}", answer);
}
```

Visit https://example.com for ~~more~~ details.
"#;
