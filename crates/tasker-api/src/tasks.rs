// Canned Tasker tasks
//
// Helpers built on top of [`TaskerClient`] that depend on tasks shipped
// with this crate as Tasker XML. The Device Info task is the important
// one: it is how a stable device identity is resolved during bootstrap,
// and it is imported on the fly when the remote doesn't have it yet.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::client::TaskerClient;
use crate::error::Error;
use crate::models::DeviceInfo;

/// Name of the bundled device-identity task.
pub const TASK_DEVICE_INFO: &str = "Device Info";

/// Tasker XML for the Device Info task, imported when the remote doesn't
/// already have a task by that name.
pub const XML_DEVICE_INFO: &str = include_str!("../data/device_info.tsk.xml");

static TASK_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(<TaskerData.*>.*)<nme>.*</nme>").expect("literal pattern")
});

/// Rewrite the task name inside a Tasker XML export (single replacement).
///
/// Used to import a bundled task under a caller-chosen name. If the XML
/// has no `<nme>` element the input is returned unchanged.
pub fn rename_task_xml(name: &str, xml: &str) -> String {
    TASK_NAME_RE
        .replace(xml, |caps: &regex::Captures<'_>| {
            format!("{}<nme>{name}</nme>", &caps[1])
        })
        .into_owned()
}

/// Resolve the device's stable identity by running the Device Info task.
///
/// With `import_task` unset, the remote's task list decides whether the
/// bundled XML needs importing first. `name` overrides the friendly name
/// in the reply. Identity is required for bootstrap, so a payload that
/// doesn't parse is an error here rather than a soft `None`.
pub async fn device_info(
    client: &TaskerClient,
    name: Option<&str>,
    import_task: Option<bool>,
) -> Result<DeviceInfo, Error> {
    let import_task = match import_task {
        Some(import) => import,
        None => client.task(TASK_DEVICE_INFO).await?.is_none(),
    };
    if import_task {
        info!("importing the Device Info task");
        client.import_task(XML_DEVICE_INFO, None).await?;
    }

    debug!("running the Device Info task");
    let output = client
        .run_task(TASK_DEVICE_INFO, &serde_json::Map::new(), true, None)
        .await?;

    let mut info = DeviceInfo::from_output(&output).ok_or_else(|| Error::Deserialization {
        message: "Device Info task output is not a device identity".into(),
        body: output.to_string(),
    })?;
    if let Some(name) = name {
        info.name = Some(name.to_owned());
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{XML_DEVICE_INFO, rename_task_xml};

    #[test]
    fn rename_replaces_task_name() {
        let xml = "<TaskerData sr=\"\" dvi=\"1\">\n<Task sr=\"task1\">\n<id>1</id>\n<nme>Old Name</nme>\n</Task>\n</TaskerData>";
        let renamed = rename_task_xml("New Name", xml);
        assert!(renamed.contains("<nme>New Name</nme>"));
        assert!(!renamed.contains("Old Name"));
    }

    #[test]
    fn rename_without_nme_is_identity() {
        let xml = "<TaskerData sr=\"\"><Task sr=\"task1\"/></TaskerData>";
        assert_eq!(rename_task_xml("X", xml), xml);
    }

    #[test]
    fn bundled_xml_names_the_device_info_task() {
        assert!(XML_DEVICE_INFO.contains("<nme>Device Info</nme>"));
    }
}
