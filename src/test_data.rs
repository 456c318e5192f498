#[cfg(test)]
pub const VALID_FRONT_MATTER: &str = "title: Shipping a blog in Rust
date: 2024-06-01
publishedAt: 2024-06-02 09:30
published: true
author: Jane Doe
tags: [rust, web, rust]
category: engineering
changeLog:
  - date: 2024-06-02
    changes: [Initial release]
  - date: 2024-07-10
    changes:
      - Fixed typos
      - Added benchmarks
";

#[cfg(test)]
pub const POST_DATA_MDX: &str = r##"---
title: Shipping a blog in Rust
date: 2024-06-01
publishedAt: 2024-06-02 09:30
published: true
author: Jane Doe
tags: [rust, web, rust]
category: engineering
changeLog:
  - date: 2024-06-02
    changes: [Initial release]
---

A short story about rewriting my site.

<!-- more -->

## Why

Because I wanted **fast** pages.

```rust title="main.rs"
fn main() {
    println!("hello");
}
```

## Why
"##;

#[cfg(test)]
pub fn post_with(name: &str, date: &str, category: &str, tags: &[&str], published: bool) -> String {
    format!(r##"---
title: {name}
date: {date}
publishedAt: {date}
published: {published}
author: Jane Doe
tags: [{tags}]
category: {category}
changeLog:
  - date: {date}
    changes: [Initial release]
---
Excerpt of {name}.

<!-- more -->

Body of {name}.
"##, tags = tags.join(", "))
}

#[cfg(test)]
pub fn item(slug: &str, title: &str, date: &str, category: &str, tags: &[&str]) -> crate::content::ContentItem {
    use crate::content::{ContentItem, Slug};

    let date = crate::text_utils::parse_date_time(date).unwrap();
    ContentItem {
        slug: Slug(slug.to_string()),
        file_name: std::path::PathBuf::from(format!("{}.mdx", slug)),
        title: title.to_string(),
        date,
        published: true,
        published_at: date,
        author: "Jane Doe".to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        category: category.to_string(),
        thumbnail: format!("{}-category", category),
        description: None,
        change_log: vec![],
        body: String::new(),
        excerpt: None,
    }
}
