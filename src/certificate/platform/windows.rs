use std::path::Path;

use crate::command::{report, CommandRunner, Invocation, StepOutcome};
use crate::prompt::Prompt;

const CERTUTIL: &str = "certutil.exe";
const ROOT_STORE: &str = "Root";

#[derive(Debug, Clone)]
pub enum CertutilCommand<'p> {
    /// Cheap call used to see whether certutil exists at all
    Probe,
    AddStore(&'p Path),
    ListStore,
    DeleteSerial(&'p str),
}

impl CertutilCommand<'_> {
    pub fn invocation(&self) -> Invocation {
        let inv = Invocation::new(CERTUTIL);
        match self {
            Self::Probe => inv.arg("-?"),
            Self::AddStore(path) => inv.arg("-addstore").arg("-f").arg(ROOT_STORE).path_arg(path),
            Self::ListStore => inv.arg("-store").arg(ROOT_STORE),
            Self::DeleteSerial(serial) => inv.arg("-delstore").arg(ROOT_STORE).arg(*serial),
        }
    }
}

pub fn certutil_available(runner: &dyn CommandRunner) -> bool {
    runner
        .run(&CertutilCommand::Probe.invocation())
        .map(|out| out.success)
        .unwrap_or(false)
}

// Older Windows releases ship without certutil; walk the user through the wizard instead
pub fn manual_install(runner: &dyn CommandRunner, prompt: &dyn Prompt, ca_cert: &Path) {
    prompt.warn(
        "Warning - Trayport",
        &format!(
            "Automatic certificate installation is not available for this platform.\n\
             For secure websockets to function properly:\n\n\
             \x20    1.  Navigate to \"{}\"\n\
             \x20    2.  Click \"Install Certificate...\"\n\
             \x20    3.  Click \"Place all certificates in the following store\"\n\
             \x20    4.  Browse to \"Trusted Root Certificate Authorities\"\n\
             \x20    5.  Click \"Finish\"\n\
             \x20    6.  Click \"Yes\" on thumbprint Security Warning\n\n\
             Click OK to automatically launch the certificate import wizard now.\n",
            ca_cert.display()
        ),
    );

    launch(runner, &import_wizard(ca_cert), "Launching certificate import wizard");
}

// rundll32 splits its own command line; a quoted entry point is read as the DLL name
fn import_wizard(ca_cert: &Path) -> Invocation {
    Invocation::new("rundll32.exe")
        .arg("cryptext.dll,CryptExtAddCER")
        .path_arg(ca_cert)
        .verbatim()
}

// Launch failures are reported, never fatal
fn launch(runner: &dyn CommandRunner, invocation: &Invocation, step: &str) {
    match runner.run(invocation) {
        Ok(output) if output.success => report(StepOutcome::Success, step),
        Ok(_) => report(StepOutcome::Failed, step),
        Err(e) => report(StepOutcome::Failed, format!("{}: {}", step, e)),
    }
}

pub fn manual_uninstall(runner: &dyn CommandRunner, prompt: &dyn Prompt, common_name: &str) {
    prompt.warn(
        "Warning - Trayport",
        &format!(
            "Automatic certificate deletion is not available for this platform.\n\
             To completely remove unused certificates:\n\n\
             \x20    1.  Manage computer certificates\n\
             \x20    2.  Click \"Trusted Root Certificate Authorities...\"\n\
             \x20    3.  Click \"Certificates\"\n\
             \x20    4.  Browse to \"{}, {}\"\n\
             \x20    5.  Right Click, \"Delete\"\n\
             Click OK to automatically launch the certificate manager.\n",
            common_name,
            crate::certificate::keytool::ORGANIZATION
        ),
    );

    launch(
        runner,
        &Invocation::new("mmc.exe").arg("certmgr.msc"),
        "Launching certificate manager",
    );
}
