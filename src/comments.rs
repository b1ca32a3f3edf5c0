/// Load comment templates from a plain-text file, one template per line,
/// in file order. Lines are kept as written; trimming happens at post time.
///
/// A missing file is not fatal: it yields an empty list, and the dispatcher
/// refuses to run with no templates.
pub fn load_comments(path: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            eprintln!("File {} not found. Make sure the file exists.", path);
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    Ok(content.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> String {
        let nonce: u64 = rand::random();
        std::env::temp_dir()
            .join(format!("comments-test-{}-{}.txt", name, nonce))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn missing_file_yields_empty_list() {
        let comments = load_comments("definitely-not-here.txt").unwrap();
        assert!(comments.is_empty());
    }

    #[test]
    fn lines_are_kept_in_file_order() {
        let path = temp_path("order");
        std::fs::write(&path, "Great video!\n  Nice content  \n\nlast one").unwrap();

        let comments = load_comments(&path).unwrap();
        assert_eq!(
            comments,
            vec!["Great video!", "  Nice content  ", "", "last one"]
        );

        std::fs::remove_file(&path).ok();
    }
}
