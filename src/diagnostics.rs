//! Multi-line diagnostics for failed external commands.
//!
//! Each builder embeds the executed command and its captured output so the
//! message alone is enough to reproduce the failure by hand.

/// Indent every continuation line of `text` by `pad`.
pub fn indent(text: &str, pad: &str) -> String {
    text.replace('\n', &format!("\n{}", pad))
}

/// The identity service could not be reached or answered with nothing.
pub fn cric_unreachable(command: &str, stdout: &str, stderr: &str) -> String {
    format!(
        "Error contacting CRIC.\n\
         Details follow:\n\
         \x20 Executed command: {}\n\
         \x20   Stdout:\n\
         \x20     {}\n\
         \x20   Stderr:\n\
         \x20     {}",
        command,
        indent(stdout, "      "),
        indent(stderr, "      ")
    )
}

/// The identity service answered but no usable login could be extracted.
pub fn cric_username_missing(command: &str, stdout: &str, parsed: &str) -> String {
    format!(
        "Failed to retrieve username from CRIC.\n\
         Details follow:\n\
         \x20 Executed command: {}\n\
         \x20   Stdout:\n\
         \x20     {}\n\
         \x20   Parsed username: {}\n\
         Note: Make sure you have the correct certificate mapped in your CERN account page \
         (you can check what is the certificate you currently have mapped \
         by looking at CERN Certification Authority page).\n\
         For instructions on how to map a certificate, see \n\
         \x20 https://twiki.cern.ch/twiki/bin/view/CMSPublic/UsernameForCRAB#Adding_your_DN_to_your_profile",
        command,
        indent(stdout, "      "),
        parsed
    )
}

/// A command exited nonzero, could not run, or printed nothing.
pub fn command_failed(command: &str, exit_code: &str, stdout: &str, stderr: &str) -> String {
    let mut msg = format!("Failed executing {}. Exitcode is {}", command, exit_code);
    if !stdout.is_empty() {
        msg.push_str(&format!("\n  Stdout:\n    {}", indent(stdout, "    ")));
    }
    if !stderr.is_empty() {
        msg.push_str(&format!("\n  Stderr:\n    {}", indent(stderr, "    ")));
    }
    msg
}

/// A command succeeded but its output did not have the expected shape.
pub fn unexpected_output(command: &str, reason: &str, stdout: &str) -> String {
    format!(
        "Unexpected output from {}: {}\n  Stdout:\n    {}",
        command,
        reason,
        indent(stdout, "    ")
    )
}
