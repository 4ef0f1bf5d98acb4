use std::collections::BTreeMap;

use crate::CommandOutput;

/// Minimal HDFS namespace plus per-unit local files, enough to run the
/// workload probes.
#[derive(Debug, Default)]
pub(crate) struct HdfsModel {
    superuser: String,
    /// path -> owner
    dirs: BTreeMap<String, String>,
    /// path -> (owner, contents)
    files: BTreeMap<String, (String, String)>,
    /// (unit, path) -> contents
    local: BTreeMap<(String, String), String>,
}

impl HdfsModel {
    pub(crate) fn new(superuser: &str) -> Self {
        let mut dirs = BTreeMap::new();
        dirs.insert("/".to_string(), superuser.to_string());
        dirs.insert("/user".to_string(), superuser.to_string());
        Self {
            superuser: superuser.to_string(),
            dirs,
            ..Default::default()
        }
    }

    pub(crate) fn exists(
        &self,
        path: &str,
    ) -> bool {
        self.dirs.contains_key(path) || self.files.contains_key(path)
    }

    pub(crate) fn owner(
        &self,
        path: &str,
    ) -> Option<&str> {
        self.dirs
            .get(path)
            .or_else(|| self.files.get(path).map(|(owner, _)| owner))
            .map(String::as_str)
    }

    /// Runs one shell script on `unit` as `identity`. `serving` tells whether
    /// a NameNode is able to answer.
    pub(crate) fn run(
        &mut self,
        unit: &str,
        identity: &str,
        script: &str,
        serving: bool,
    ) -> CommandOutput {
        let tokens: Vec<&str> = script.split_whitespace().collect();
        match tokens.as_slice() {
            ["echo", rest @ ..] => self.echo(unit, rest),
            ["hdfs", "dfs", rest @ ..] if serving => self.dfs(unit, identity, rest),
            ["hadoop", "jar", _jar, rest @ ..] if serving => self.job(identity, rest),
            ["hdfs", "dfs", ..] | ["hadoop", "jar", ..] => CommandOutput::new(
                format!(
                    "Call From {unit} to namenode:8020 failed on connection exception: \
                     java.net.ConnectException: Connection refused"
                ),
                1,
            ),
            _ => CommandOutput::new(format!("{}: command not found", tokens.first().unwrap_or(&"")), 127),
        }
    }

    fn echo(
        &mut self,
        unit: &str,
        rest: &[&str],
    ) -> CommandOutput {
        match rest.iter().position(|t| *t == ">") {
            Some(pos) if pos + 1 < rest.len() => {
                let contents = format!("{}\n", rest[..pos].join(" "));
                self.local
                    .insert((unit.to_string(), rest[pos + 1].to_string()), contents);
                CommandOutput::new("", 0)
            }
            _ => CommandOutput::new(format!("{}\n", rest.join(" ")), 0),
        }
    }

    fn dfs(
        &mut self,
        unit: &str,
        identity: &str,
        args: &[&str],
    ) -> CommandOutput {
        match args {
            ["-mkdir", "-p", path] => {
                let path = resolve(identity, path);
                if !self.may_write(identity, &path) {
                    return denied("mkdir", &path, identity);
                }
                for ancestor in ancestors(&path) {
                    self.dirs.entry(ancestor).or_insert_with(|| identity.to_string());
                }
                CommandOutput::new("", 0)
            }
            ["-chown", owner, path] => {
                let path = resolve(identity, path);
                if identity != self.superuser {
                    return denied("chown", &path, identity);
                }
                let user = owner.split(':').next().unwrap_or(*owner);
                match self.dirs.get_mut(&path) {
                    Some(current) => {
                        *current = user.to_string();
                        CommandOutput::new("", 0)
                    }
                    None => missing("chown", &path),
                }
            }
            ["-chmod", "-R", _mode, path] => {
                let path = resolve(identity, path);
                if !self.exists(&path) {
                    return missing("chmod", &path);
                }
                if identity != self.superuser && self.owner(&path) != Some(identity) {
                    return denied("chmod", &path, identity);
                }
                CommandOutput::new("", 0)
            }
            ["-put", local, rest @ ..] => {
                let Some(contents) = self.local.get(&(unit.to_string(), local.to_string())).cloned() else {
                    return missing("put", local);
                };
                let name = local.rsplit('/').next().unwrap_or(*local);
                let dest = resolve(identity, rest.first().copied().unwrap_or(name));
                if !self.dirs.contains_key(parent(&dest)) {
                    return missing("put", &dest);
                }
                if !self.may_write(identity, &dest) {
                    return denied("put", &dest, identity);
                }
                if self.exists(&dest) {
                    return CommandOutput::new(format!("put: `{dest}': File exists"), 1);
                }
                self.files.insert(dest, (identity.to_string(), contents));
                CommandOutput::new("", 0)
            }
            ["-cat", path] => {
                let path = resolve(identity, path);
                match self.files.get(&path) {
                    Some((_, contents)) => CommandOutput::new(contents.clone(), 0),
                    None => missing("cat", &path),
                }
            }
            ["-ls", path] => {
                let path = resolve(identity, path);
                if let Some((owner, contents)) = self.files.get(&path) {
                    return CommandOutput::new(listing_line("-rw-r--r--", owner, contents.len(), &path), 0);
                }
                if !self.dirs.contains_key(&path) {
                    return missing("ls", &path);
                }
                let prefix = format!("{}/", path.trim_end_matches('/'));
                let lines: Vec<String> = self
                    .files
                    .iter()
                    .filter(|(p, _)| p.starts_with(&prefix))
                    .map(|(p, (owner, contents))| listing_line("-rw-r--r--", owner, contents.len(), p))
                    .collect();
                CommandOutput::new(format!("Found {} items\n{}", lines.len(), lines.join("")), 0)
            }
            ["-rm", "-r", path] => {
                let path = resolve(identity, path);
                if !self.exists(&path) {
                    return missing("rm", &path);
                }
                if !self.may_write(identity, &path) {
                    return denied("rm", &path, identity);
                }
                let prefix = format!("{path}/");
                self.dirs.retain(|p, _| *p != path && !p.starts_with(&prefix));
                self.files.retain(|p, _| *p != path && !p.starts_with(&prefix));
                CommandOutput::new(format!("Deleted {path}"), 0)
            }
            _ => CommandOutput::new(format!("{}: Unknown command", args.first().unwrap_or(&"dfs")), 255),
        }
    }

    fn job(
        &mut self,
        identity: &str,
        args: &[&str],
    ) -> CommandOutput {
        match args {
            ["teragen", rows, out] => {
                let out = resolve(identity, out);
                self.job_output(identity, &out, format!("{rows} rows"))
            }
            ["terasort", input, out] => {
                let input = resolve(identity, input);
                if !self.files.contains_key(&format!("{input}/_SUCCESS")) {
                    return CommandOutput::new(
                        format!("Input path does not exist: hdfs://namenode:8020{input}"),
                        255,
                    );
                }
                let out = resolve(identity, out);
                self.job_output(identity, &out, format!("sorted {input}"))
            }
            ["org.apache.hadoop.io.TestSequenceFile", rest @ ..] if rest.contains(&"-check") => {
                CommandOutput::new("count = 1000\nsuccessfully checked", 0)
            }
            _ => CommandOutput::new(
                format!("Unknown program '{}' chosen.", args.first().unwrap_or(&"")),
                255,
            ),
        }
    }

    fn job_output(
        &mut self,
        identity: &str,
        out: &str,
        part: String,
    ) -> CommandOutput {
        if self.exists(out) {
            return CommandOutput::new(
                format!("Output directory hdfs://namenode:8020{out} already exists"),
                255,
            );
        }
        if !self.dirs.contains_key(parent(out)) || !self.may_write(identity, out) {
            return denied("job", out, identity);
        }
        self.dirs.insert(out.to_string(), identity.to_string());
        self.files
            .insert(format!("{out}/part-m-00000"), (identity.to_string(), part));
        self.files
            .insert(format!("{out}/_SUCCESS"), (identity.to_string(), String::new()));
        CommandOutput::new(format!("Job completed successfully, output in {out}"), 0)
    }

    /// The superuser writes anywhere; others only below a home they own.
    fn may_write(
        &self,
        identity: &str,
        path: &str,
    ) -> bool {
        if identity == self.superuser {
            return true;
        }
        let home = format!("/user/{identity}");
        let inside = path == home || path.starts_with(&format!("{home}/"));
        inside && self.dirs.get(&home).map(String::as_str) == Some(identity)
    }
}

fn resolve(
    identity: &str,
    path: &str,
) -> String {
    if path.starts_with('/') {
        path.trim_end_matches('/').to_string()
    } else {
        format!("/user/{identity}/{}", path.trim_end_matches('/'))
    }
}

fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

fn ancestors(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current.push('/');
        current.push_str(segment);
        out.push(current.clone());
    }
    out
}

fn listing_line(
    mode: &str,
    owner: &str,
    size: usize,
    path: &str,
) -> String {
    format!("{mode}   3 {owner} {owner} {size:>10} 2016-06-01 12:00 {path}\n")
}

fn missing(
    command: &str,
    path: &str,
) -> CommandOutput {
    CommandOutput::new(format!("{command}: `{path}': No such file or directory"), 1)
}

fn denied(
    command: &str,
    path: &str,
    identity: &str,
) -> CommandOutput {
    CommandOutput::new(
        format!("{command}: Permission denied: user={identity}, access=WRITE, path=\"{path}\""),
        1,
    )
}
