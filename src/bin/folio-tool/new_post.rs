use std::fmt::Write;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDateTime, Utc};

use folio::util::os_helper::author_name;

use crate::{NewArgs, PostOutput};

fn get_author(args: &NewArgs) -> String {
    match args.author {
        Some(ref name) => name.clone(),
        None => author_name(),
    }
}

// JSON strings are valid double quoted YAML scalars
fn quoted(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

fn render_front_matter(title: &str, author: &str, category: &str, now: &NaiveDateTime) -> String {
    let date = now.format("%Y-%m-%d");
    let published_at = now.format("%Y-%m-%d %H:%M");
    let mut buf = String::new();

    let _ = writeln!(&mut buf, "---");
    let _ = writeln!(&mut buf, "title: {}", quoted(title));
    let _ = writeln!(&mut buf, "date: {}", date);
    let _ = writeln!(&mut buf, "publishedAt: {}", published_at);
    let _ = writeln!(&mut buf, "published: false");
    let _ = writeln!(&mut buf, "author: {}", quoted(author));
    let _ = writeln!(&mut buf, "tags: []");
    let _ = writeln!(&mut buf, "category: {}", quoted(category));
    let _ = writeln!(&mut buf, "description: {}", quoted(title));
    let _ = writeln!(&mut buf, "changeLog:");
    let _ = writeln!(&mut buf, "  - date: {}", date);
    let _ = writeln!(&mut buf, "    changes: [First draft]");
    let _ = writeln!(&mut buf, "---");
    buf
}

fn render_body() -> String {
    let mut buf = String::new();

    let _ = writeln!(&mut buf);
    let _ = writeln!(&mut buf, "This is a body example.");
    let _ = writeln!(&mut buf, "Please remove it and replace with your content.");
    let _ = writeln!(&mut buf);
    let _ = writeln!(&mut buf, "<!-- more -->");
    let _ = writeln!(&mut buf);
    let _ = writeln!(&mut buf, "## And this is the rest of your post");

    buf
}

/// File name for a post: ASCII, lowercase, words joined by single dashes.
fn file_slug(title: &str) -> String {
    let ascii = unidecode::unidecode(title).to_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

pub fn new_post(title: &str, author: &str, category: &str, now: &NaiveDateTime) -> String {
    render_front_matter(title, author, category, now) + &render_body()
}

pub fn new_cmd(args: NewArgs) -> Result<()> {
    let author = get_author(&args);
    let now = Utc::now().naive_utc();
    let content = new_post(&args.title, &author, &args.category, &now);

    let slug = file_slug(&args.title);
    if slug.is_empty() && !matches!(args.output, PostOutput::Stdout) {
        bail!("Title {:?} has no characters usable in a file name", args.title);
    }

    match args.output {
        PostOutput::Stdout => print!("{}", content),
        PostOutput::File => {
            let file_name = PathBuf::from(format!("{}.mdx", slug));
            if file_name.exists() {
                bail!("{} already exists", file_name.display());
            }
            println!("Creating file {}", file_name.display());
            fs::write(&file_name, content).with_context(|| format!("Could not write {}", file_name.display()))?;
        }
        PostOutput::Dir => {
            let dir_name = PathBuf::from(&slug);
            let full_path = dir_name.join("index.mdx");
            println!("Creating dir post {}", full_path.display());
            fs::create_dir(&dir_name).with_context(|| format!("Could not create {}", dir_name.display()))?;
            fs::write(&full_path, content).with_context(|| format!("Could not write {}", full_path.display()))?;
        }
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use chrono::NaiveDate;

    use folio::content::front_matter::{split_content, validate};

    use super::*;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(6, 20, 53).unwrap()
    }

    #[test]
    fn test_scaffold_is_valid() {
        let post = new_post("Rust: the \"good\" parts", "Jane Doe", "engineering", &at(2024, 2, 29));
        let split = split_content(&post, "<!-- more -->");

        let front_matter = validate(Path::new("new.mdx"), split.front_matter.unwrap()).unwrap();
        assert_eq!(front_matter.title, "Rust: the \"good\" parts");
        assert_eq!(front_matter.date, "2024-02-29");
        assert_eq!(front_matter.published_at, "2024-02-29 06:20");
        assert!(!front_matter.published);
        assert!(front_matter.tags.is_empty());
        assert_eq!(front_matter.change_log.len(), 1);

        assert_eq!(split.excerpt.as_deref(), Some("This is a body example.\nPlease remove it and replace with your content."));
    }

    #[test]
    fn test_slug_from_title() {
        assert_eq!(file_slug("Post title of mine ábaco - dir2"), "post-title-of-mine-abaco-dir2");
        assert_eq!(file_slug("  What's new in 2.0?  "), "what-s-new-in-2-0");
        assert_eq!(file_slug("!!!"), "");
    }
}
