//! End-to-end tests of the object pipeline over definition files.

use monconf::core::ObjectKind;
use monconf::parser::read_definitions;
use monconf::pipeline::ObjectConfig;
use monconf::schema::Value;
use monconf::test_utils::{ConfigFixture, init_test_logging};

const BASE: &str = "\
define command {
    command_name    check_ping
    command_line    /usr/lib/nagios/plugins/check_ping -H $HOSTADDRESS$
}
define command {
    command_name    check_http
    command_line    /usr/lib/nagios/plugins/check_http -H $HOSTADDRESS$
}
define host {
    name                generic-host
    register            0
    check_command       check_ping
    check_period        24x7
    notification_period 24x7
    max_check_attempts  3
}
define service {
    name                generic-service
    register            0
    max_check_attempts  4
    check_interval      5
}
";

fn load(fixture: &ConfigFixture, files: &[(&str, &str)]) -> (ObjectConfig, bool) {
    init_test_logging(None);
    let mut config = ObjectConfig::new();
    for (name, content) in files {
        let path = fixture.write(name, content).unwrap();
        config.add_definitions(read_definitions(&path).unwrap());
    }
    let valid = config.run();
    (config, valid)
}

#[test]
fn test_templates_groups_and_services_resolve_across_files() {
    let fixture = ConfigFixture::new().unwrap();
    let hosts = "\
define host {
    use         generic-host
    host_name   web01
    address     10.0.0.1
    hostgroups  web
}
define host {
    use         generic-host
    host_name   web02
    hostgroups  web
    max_check_attempts 5
}
define hostgroup {
    hostgroup_name  web
    alias           Web servers
}
";
    let services = "\
define service {
    use                 generic-service
    hostgroup_name      web
    service_description HTTP
    check_command       check_http!/health
}
";
    let (config, valid) =
        load(&fixture, &[("base.cfg", BASE), ("hosts.cfg", hosts), ("services.cfg", services)]);
    assert!(valid, "{:?}", config.diagnostics());

    let web01 = config.hosts.find("web01").unwrap();
    assert_eq!(web01.get("max_check_attempts"), Some(&Value::Int(3)));
    assert_eq!(web01.get_str("address").as_deref(), Some("10.0.0.1"));
    let web02 = config.hosts.find("web02").unwrap();
    assert_eq!(web02.get("max_check_attempts"), Some(&Value::Int(5)));
    assert_eq!(web02.get_str("address").as_deref(), Some("web02"));

    let names: Vec<String> = config.services.item_names().into_iter().collect();
    assert_eq!(names, vec!["web01/HTTP", "web02/HTTP"]);
    for service in config.services.items() {
        assert_eq!(service.get("max_check_attempts"), Some(&Value::Int(4)));
        assert_eq!(service.get_str("check_period").as_deref(), Some("24x7"));
    }

    let group = config.host_groups.find("web").unwrap();
    let members = group.get("members").map(Value::to_names).unwrap_or_default();
    assert_eq!(members, vec!["web01".to_string(), "web02".to_string()]);
}

#[test]
fn test_generated_services_and_overrides() {
    let fixture = ConfigFixture::new().unwrap();
    let objects = "\
define host {
    use                 generic-host
    host_name           db01
    _disks              sda,sdb
    service_overrides   Disk sdb,check_interval 1
}
define service {
    use                 generic-service
    host_name           db01
    service_description Disk $KEY$
    check_command       check_ping!$KEY$
    duplicate_foreach   _disks
}
";
    let (config, valid) = load(&fixture, &[("base.cfg", BASE), ("db.cfg", objects)]);
    assert!(valid, "{:?}", config.diagnostics());

    let names: Vec<String> = config.services.item_names().into_iter().collect();
    assert_eq!(names, vec!["db01/Disk sda", "db01/Disk sdb"]);
    for service in config.services.items() {
        let expected = if service.get_name() == "db01/Disk sdb" { 1 } else { 5 };
        assert_eq!(service.get("check_interval"), Some(&Value::Int(expected)));
    }
}

#[test]
fn test_problems_are_collected_not_thrown() {
    let fixture = ConfigFixture::new().unwrap();
    let objects = "\
define host {
    use         generic-host
    host_name   a
    parents     b
}
define host {
    use         generic-host
    host_name   b
    parents     a
}
define command {
    command_name    broken
}
define service {
    host_name           a
    service_description PING
    check_command       check_nothing
    contacts            nobody
}
define timeperiod {
    timeperiod_name 24x7
}
";
    let (config, valid) = load(&fixture, &[("base.cfg", BASE), ("broken.cfg", objects)]);
    assert!(!valid);

    let diagnostics = config.diagnostics();
    let has_error = |needle: &str| diagnostics.errors.iter().any(|e| e.contains(needle));
    assert!(has_error("Loop detected while checking parents"));
    assert!(has_error("[command::broken] command_line property is missing"));
    assert!(has_error("the command 'check_nothing' is unknown"));
    assert!(diagnostics.warnings.iter().any(|w| w.contains("the contact 'nobody' is unknown")));
    assert!(diagnostics.warnings.iter().any(|w| w.contains("'timeperiod' are not handled")));
    assert_eq!(config.collection(ObjectKind::Host).len(), 2);
    assert_eq!(config.collection(ObjectKind::Command).len(), 3);
}
