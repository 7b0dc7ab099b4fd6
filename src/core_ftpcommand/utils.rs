/// Joins a client path argument onto the working directory.
///
/// Absolute arguments replace `cwd`; an empty argument yields `cwd`.
pub fn with_cwd(cwd: &str, arg: &str) -> String {
    if arg.is_empty() {
        cwd.to_string()
    } else if arg.starts_with('/') {
        arg.to_string()
    } else if cwd.ends_with('/') {
        format!("{}{}", cwd, arg)
    } else {
        format!("{}/{}", cwd, arg)
    }
}

/// Resolves `.` and `..` lexically. The result is absolute and never climbs above `/`.
pub fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    format!("/{}", parts.join("/"))
}

/// Drops leading `-x` option tokens from a LIST/NLST argument.
pub fn strip_options(arg: &str) -> &str {
    let mut rest = arg.trim_start();
    while rest.starts_with('-') {
        rest = match rest.split_once(char::is_whitespace) {
            Some((_, tail)) => tail.trim_start(),
            None => "",
        };
    }
    rest
}

/// Parent of a normalized virtual path; `/` is its own parent.
pub fn parent_path(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(pos) => path[..pos].to_string(),
    }
}
