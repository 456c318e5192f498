/// Name used as the default author of new content: the real name of the OS
/// user, or the login name when the real name is not set.
pub fn author_name() -> String {
    let name = whoami::realname();
    if name.trim().is_empty() {
        return whoami::username();
    }
    name
}
