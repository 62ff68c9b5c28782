use std::collections::HashSet;
use std::sync::Arc;

use matches::assert_matches;

use perigatt_const::{Characteristic as Char, Descriptor as Desc, Service as Svc, Unit};

use crate::host::{HostEvent, Kind, Loopback};
use crate::register::RegState;

use super::*;

const BASE: &str = "/org/bluez/example";

/// Test application:
///
/// ```text
/// service0 (DIS)
///   char0 read, initial value "1.0"
///   char1 write-without-response
/// service1 (CPS)
///   char0 read | write | notify
///     desc0 user description
///     desc1 read | write
///   char1 notify, callback-produced values
/// service2 (secondary, includes service0)
///   char0 read, callback-produced values
/// ```
fn app() -> Application {
    let mut b = Application::build(Arc::new(Discard));
    let (dis, ()) = b.primary_service(Svc::DeviceInformation, [], |s| {
        s.ro_characteristic(Char::ModelNumberString, "1.0", |_| {});
        s.characteristic(
            Char::SerialNumberString,
            CharFlags::WRITE_WITHOUT_RESPONSE,
            Io::NONE,
            |_| {},
        );
    });
    b.primary_service(Svc::CyclingPower, [], |s| {
        let flags = CharFlags::READ | CharFlags::WRITE | CharFlags::NOTIFY;
        s.characteristic(Char::CyclingPowerControlPoint, flags, Io::NONE, |c| {
            c.user_description("Control point");
            c.descriptor(
                Desc::ClientCharacteristicConfiguration,
                DescFlags::READ | DescFlags::WRITE,
                Io::NONE,
            );
        });
        let io = Io::from(|req: IoReq| -> IoResult {
            if let IoReq::Notify(n) = req {
                n.notify(vec![0, 0, 150, 0]);
            }
            Ok(())
        });
        s.characteristic(Char::CyclingPowerMeasurement, CharFlags::NOTIFY, io, |_| {});
    });
    b.secondary_service(Svc::Battery, [dis], |s| {
        let io = Io::from(|req: IoReq| -> IoResult {
            match req {
                IoReq::Read(r) => r.complete([100_u8, 99]),
                _ => Ok(()),
            }
        });
        s.characteristic(Char::BatteryLevel, CharFlags::READ, io, |_| {});
    });
    b.freeze()
}

fn path(p: &str) -> ObjectPath {
    ObjectPath::new(format!("{BASE}/{p}"))
}

fn chr<'a>(app: &'a Application, p: &str) -> &'a Characteristic {
    app.characteristic(&path(p)).unwrap()
}

fn read(c: &Characteristic) -> Result<Vec<u8>> {
    c.read_value(&ReadOptions::default())
}

fn write(c: &Characteristic, v: &[u8]) -> Result<()> {
    c.write_value(v, &WriteOptions::default())
}

#[test]
fn paths() {
    let app = app();
    assert_eq!(app.path(), BASE);
    let s = &app.services()[1];
    assert_eq!(s.path(), &path("service1"));
    assert_eq!(s.application(), BASE);
    let c = &s.characteristics()[0];
    assert_eq!(c.path(), &path("service1/char0"));
    assert_eq!(c.service(), s.path());
    let d = &c.descriptors()[1];
    assert_eq!(d.path(), &path("service1/char0/desc1"));
    assert_eq!(d.characteristic(), c.path());
    assert_eq!(d.uuid(), Desc::ClientCharacteristicConfiguration);

    let sec = &app.services()[2];
    assert!(!sec.is_primary());
    assert_eq!(sec.includes(), [path("service0")]);
}

#[test]
fn read_not_permitted() {
    let app = app();
    let c = chr(&app, "service0/char1");
    app.force_state(RegState::Registered);
    write(c, &[1, 2]).unwrap();
    assert_eq!(c.value(), [1, 2]);
    assert_eq!(read(c), Err(Error::NotPermitted));
    assert_eq!(read(chr(&app, "service1/char1")), Err(Error::NotPermitted));
}

#[test]
fn write_not_permitted() {
    let app = app();
    app.force_state(RegState::Registered);
    let c = chr(&app, "service0/char0");
    assert_eq!(write(c, &[1]), Err(Error::NotPermitted));
    assert_eq!(read(c).unwrap(), b"1.0");
    assert_eq!(
        write(chr(&app, "service1/char1"), &[1]),
        Err(Error::NotPermitted)
    );
}

#[test]
fn write_requires_registration() {
    let app = app();
    let c = chr(&app, "service1/char0");
    assert_eq!(
        write(c, &[1]),
        Err(Error::InvalidState("application not registered"))
    );
    app.force_state(RegState::Pending);
    assert_matches!(write(c, &[1]), Err(Error::InvalidState(_)));
    app.force_state(RegState::Registered);
    write(c, &[1]).unwrap();
}

#[test]
fn write_then_read() {
    let app = app();
    app.force_state(RegState::Registered);
    let c = chr(&app, "service1/char0");
    assert!(read(c).unwrap().is_empty());
    write(c, &[1, 2, 3]).unwrap();
    assert_eq!(read(c).unwrap(), [1, 2, 3]);

    // Offset writes extend the value
    c.write_value(&[4, 5], &WriteOptions::at(2)).unwrap();
    assert_eq!(read(c).unwrap(), [1, 2, 4, 5]);
    c.write_value(&[6], &WriteOptions::at(4)).unwrap();
    assert_eq!(read(c).unwrap(), [1, 2, 4, 5, 6]);
    assert_eq!(
        c.write_value(&[7], &WriteOptions::at(6)),
        Err(Error::InvalidOffset)
    );

    assert_eq!(c.read_value(&ReadOptions::at(3)).unwrap(), [5, 6]);
    assert!(c.read_value(&ReadOptions::at(5)).unwrap().is_empty());
    assert_eq!(c.read_value(&ReadOptions::at(6)), Err(Error::InvalidOffset));
}

#[test]
fn write_replaces() {
    let app = app();
    app.force_state(RegState::Registered);
    let c = chr(&app, "service1/char0");
    write(c, &[1, 2, 3]).unwrap();
    write(c, &[9]).unwrap();
    assert_eq!(read(c).unwrap(), [9]);
    c.write_value(&[1, 2, 3], &WriteOptions::default()).unwrap();
    c.write_value(&[8], &WriteOptions::at(1)).unwrap();
    assert_eq!(read(c).unwrap(), [1, 8]);
    c.write_value(&[], &WriteOptions::at(1)).unwrap();
    assert_eq!(read(c).unwrap(), [1]);

    let d = app.descriptor(&path("service1/char0/desc1")).unwrap();
    d.write_value(&[1, 0], &WriteOptions::default()).unwrap();
    d.write_value(&[0], &WriteOptions::default()).unwrap();
    assert_eq!(d.value(), [0]);
}

#[test]
fn rejected_write() {
    let reject = || {
        Io::from(|req: IoReq| -> IoResult {
            match req {
                IoReq::Write(w) if w.value().len() > 2 => {
                    Err(Error::InvalidArguments("too long".to_owned()))
                }
                _ => Ok(()),
            }
        })
    };
    let mut b = Application::build(Arc::new(Discard));
    let (_, (c, d)) = b.primary_service(Svc::CyclingPower, [], |s| {
        let flags = CharFlags::READ | CharFlags::WRITE;
        s.characteristic(Char::CyclingPowerControlPoint, flags, reject(), |c| {
            c.descriptor(
                Desc::ClientCharacteristicConfiguration,
                DescFlags::READ | DescFlags::WRITE,
                reject(),
            )
        })
    });
    let app = b.freeze();
    app.force_state(RegState::Registered);

    let c = app.characteristic(&c).unwrap();
    write(c, &[1, 2]).unwrap();
    assert_matches!(write(c, &[3, 4, 5]), Err(Error::InvalidArguments(_)));
    assert_eq!(c.value(), [1, 2]);
    assert_matches!(
        c.write_value(&[6, 7], &WriteOptions::at(1)),
        Err(Error::InvalidArguments(_))
    );
    assert_eq!(read(c).unwrap(), [1, 2]);

    let d = app.descriptor(&d).unwrap();
    d.write_value(&[1, 0], &WriteOptions::default()).unwrap();
    assert_matches!(
        d.write_value(&[1, 0, 0], &WriteOptions::default()),
        Err(Error::InvalidArguments(_))
    );
    assert_eq!(d.value(), [1, 0]);
}

#[test]
fn read_callback() {
    let app = app();
    let c = chr(&app, "service2/char0");
    assert_eq!(read(c).unwrap(), [100, 99]);
    assert_eq!(c.value(), [100, 99]);
    assert_eq!(c.read_value(&ReadOptions::at(1)).unwrap(), [99]);
    assert_eq!(c.read_value(&ReadOptions::at(3)), Err(Error::InvalidOffset));
}

#[tokio::test]
async fn start_notify_twice() {
    let app = app();
    let c = chr(&app, "service1/char1");
    assert!(!c.is_notifying());
    c.start_notify().unwrap();
    c.start_notify().unwrap();
    assert!(c.is_notifying());
    assert_eq!(app.scheduler().len(), 1);
    assert!(app.scheduler().is_armed(c.path()));

    c.stop_notify().unwrap();
    assert!(!c.is_notifying());
    assert!(app.scheduler().is_empty());
}

#[tokio::test]
async fn stop_notify_noop() {
    let app = app();
    let c = chr(&app, "service1/char0");
    c.stop_notify().unwrap();
    assert!(!c.is_notifying());
    assert!(app.scheduler().is_empty());

    let ro = chr(&app, "service0/char0");
    assert_eq!(ro.start_notify(), Err(Error::NotPermitted));
    assert_eq!(ro.stop_notify(), Err(Error::NotPermitted));
    assert!(!ro.is_notifying());
}

#[test]
fn managed_objects() {
    let app = app();
    let objs = app.managed_objects();
    let (mut n, mut paths) = (0, HashSet::new());
    for s in app.services() {
        n += 1;
        paths.insert(s.path().clone());
        for c in s.characteristics() {
            n += 1;
            paths.insert(c.path().clone());
            for d in c.descriptors() {
                n += 1;
                paths.insert(d.path().clone());
            }
        }
    }
    assert_eq!(n, 3 + 5 + 2);
    assert_eq!(objs.len(), n);
    assert_eq!(paths.len(), n);
    assert!(paths.iter().all(|p| objs.contains_key(p)));
    assert!(!objs.contains_key(app.path()));

    let s = &objs[&path("service1")][GATT_SERVICE];
    assert_eq!(s["Primary"].as_bool(), Some(true));
    assert_eq!(
        s["Characteristics"].as_paths().unwrap(),
        [path("service1/char0"), path("service1/char1")]
    );
    let c = &objs[&path("service1/char0")][GATT_CHARACTERISTIC];
    assert_eq!(
        c["Flags"].as_strs().unwrap(),
        ["read", "write", "notify"]
    );
    assert_eq!(c["Notifying"].as_bool(), Some(false));
    assert!(!c.contains_key("Value"));
    let c = &objs[&path("service0/char0")][GATT_CHARACTERISTIC];
    assert!(!c.contains_key("Notifying"));
    assert_eq!(c["Value"].as_bytes(), Some(b"1.0".as_slice()));
    assert_eq!(
        c["UUID"].as_str(),
        Some("00002a24-0000-1000-8000-00805f9b34fb")
    );
    let s = &objs[&path("service2")][GATT_SERVICE];
    assert_eq!(s["Includes"].as_paths().unwrap(), [path("service0")]);
}

#[test]
fn get_all() {
    let app = app();
    let p = path("service1/char0/desc0");
    let d = app.get_all(&p, GATT_DESCRIPTOR).unwrap();
    assert_eq!(d["Value"].as_bytes(), Some(b"Control point".as_slice()));
    assert_eq!(d["Flags"].as_strs().unwrap(), ["read"]);
    assert_matches!(
        app.get_all(&p, GATT_CHARACTERISTIC),
        Err(Error::InvalidArguments(_))
    );
    assert_matches!(
        app.get_all(&path("service0"), "org.bluez.GattService2"),
        Err(Error::InvalidArguments(_))
    );
    assert_matches!(
        app.get_all(app.path(), GATT_SERVICE),
        Err(Error::InvalidArguments(_))
    );
}

#[test]
fn lookup() {
    let app = app();
    assert!(app.service(&path("service1")).is_ok());
    assert!(app.descriptor(&path("service1/char0/desc1")).is_ok());
    for p in [
        "service3",
        "service1/char2",
        "service1/char0/desc2",
        "service10/char0",
        "service1/char0x",
    ] {
        let p = path(p);
        assert_eq!(app.get_all(&p, GATT_SERVICE), Err(Error::UnknownObject(p)));
    }
    assert_matches!(
        app.characteristic(&path("service1")),
        Err(Error::UnknownObject(_))
    );
    assert_matches!(
        app.descriptor(&path("service1/char0")),
        Err(Error::UnknownObject(_))
    );
    assert_matches!(
        app.service(&ObjectPath::new("/org/bluez")),
        Err(Error::UnknownObject(_))
    );
}

#[test]
fn descriptors() {
    let app = app();
    let d = app.descriptor(&path("service1/char0/desc1")).unwrap();
    assert!(d.read_value(&ReadOptions::default()).unwrap().is_empty());
    d.write_value(&[1, 0], &WriteOptions::default()).unwrap();
    assert_eq!(d.read_value(&ReadOptions::at(1)).unwrap(), [0]);
    assert_eq!(
        d.write_value(&[1], &WriteOptions::at(3)),
        Err(Error::InvalidOffset)
    );

    let ud = app.descriptor(&path("service1/char0/desc0")).unwrap();
    assert_eq!(ud.uuid(), Desc::CharacteristicUserDescription);
    assert_eq!(
        ud.write_value(b"x", &WriteOptions::default()),
        Err(Error::NotPermitted)
    );
}

#[test]
fn presentation_format() {
    let mut b = Application::build(Arc::new(Discard));
    b.primary_service(Svc::CyclingPower, [], |s| {
        s.ro_characteristic(Char::CyclingPowerFeature, [0_u8; 4], |c| {
            c.presentation_fmt(Format::I16, 0, Unit::Watt);
        });
    });
    let app = b.freeze();
    let d = &app.services()[0].characteristics()[0].descriptors()[0];
    assert_eq!(d.uuid(), Desc::CharacteristicPresentationFormat);
    assert_eq!(d.value(), [0x0E, 0x00, 0x26, 0x27, 0x01, 0x00, 0x00]);
}

#[test]
#[should_panic(expected = "undefined included service")]
fn undefined_include() {
    let mut b = Application::build(Arc::new(Discard));
    b.primary_service(Svc::Battery, [path("service7")], |_| {});
}

#[test]
fn dispatch() {
    let app = app();
    app.force_state(RegState::Registered);
    let c = path("service1/char0");
    let opts = Props::from([("offset".to_owned(), Value::U16(1))]);

    assert_matches!(
        app.dispatch(&c, Call::WriteValue(vec![1, 2, 3], Props::new())),
        Ok(Reply::Done)
    );
    assert_matches!(
        app.dispatch(&c, Call::ReadValue(opts.clone())),
        Ok(Reply::Value(ref v)) if v[..] == [2, 3]
    );
    let bad = Props::from([("offset".to_owned(), Value::Str("1".to_owned()))]);
    assert_matches!(
        app.dispatch(&c, Call::ReadValue(bad)),
        Err(Error::InvalidArguments(_))
    );
    assert_matches!(
        app.dispatch(app.path(), Call::GetManagedObjects),
        Ok(Reply::Objects(ref o)) if o.len() == 10
    );
    assert_matches!(
        app.dispatch(&path("service0"), Call::StartNotify),
        Err(Error::Failed(_))
    );
    assert_matches!(
        app.dispatch(&c, Call::Release),
        Err(Error::Failed(_))
    );
    assert_matches!(
        app.dispatch(&path("service1/char0/desc1"), Call::StopNotify),
        Err(Error::Failed(_))
    );
    assert_matches!(
        app.dispatch(&path("service9"), Call::GetAll(GATT_SERVICE.to_owned())),
        Err(Error::UnknownObject(_))
    );
}

#[tokio::test]
async fn handle() {
    let app = app();
    let (caller, mut reqs) = requests(4);
    let client = async {
        let e = caller.read_value(path("service0/char1")).await.unwrap_err();
        assert_eq!(e, Error::NotPermitted);
        assert_eq!(e.name(), "org.bluez.Error.NotPermitted");
        caller.read_value(path("service0/char0")).await.unwrap()
    };
    let server = async {
        for _ in 0..2 {
            app.handle(reqs.recv().await.unwrap());
        }
    };
    let (v, ()) = tokio::join!(client, server);
    assert_eq!(v, b"1.0");
}

#[tokio::test]
async fn register_unregister() {
    let app = app();
    let host = Loopback::new();
    let adapter = ObjectPath::new(Loopback::ADAPTER);
    let c = chr(&app, "service1/char1");
    c.start_notify().unwrap();

    app.register(&host, &adapter).unwrap().wait().await.unwrap();
    assert_eq!(app.state(), RegState::Registered);
    assert_eq!(
        app.register(&host, &adapter).unwrap_err(),
        Error::InvalidState("registration already submitted")
    );

    app.unregister(&host, &adapter).await.unwrap();
    app.unregister(&host, &adapter).await.unwrap();
    assert!(!c.is_notifying());
    assert!(app.scheduler().is_empty());
    assert_eq!(app.state(), RegState::Unregistered);
    let p = ObjectPath::new(BASE);
    assert_eq!(
        host.events(),
        [
            HostEvent::Register(Kind::Application, p.clone()),
            HostEvent::Unregister(Kind::Application, p),
        ]
    );
}
