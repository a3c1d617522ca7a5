mod common;

use common::{assert_family, family, PersonRef};
use simple_storage::{
    CompressionType, Decode, DecodeError, Decoder, Encode, EncodeError, Encoder, Save, Storage,
};
use std::{
    rc::Rc,
    sync::{Arc, Mutex},
};
use test_log::test;

#[test]
fn object_graph_family() -> simple_storage::Result<()> {
    let folder = tempfile::tempdir()?;
    let path = folder.path().join("people.data");
    let storage = Storage::default();

    let family = family();
    assert_family(&family);

    family.save(&storage, &path, CompressionType::Gzip)?;

    let reloaded: Vec<PersonRef> = storage.read(&path, CompressionType::Gzip)?;
    assert_family(&reloaded);

    // NOTE: Reloaded graph must not alias the original one
    for (original, reloaded) in family.iter().zip(&reloaded) {
        assert!(!Rc::ptr_eq(original, reloaded));
    }

    Ok(())
}

#[test]
fn object_graph_family_all_compressions() -> simple_storage::Result<()> {
    let storage = Storage::default();
    let family = family();

    for compression in [
        CompressionType::None,
        CompressionType::Deflate,
        CompressionType::Gzip,
    ] {
        let mut buf = vec![];
        storage.write_to(&family, &mut buf, compression)?;

        let reloaded: Vec<PersonRef> = storage.read_from(&mut &buf[..], compression)?;
        assert_family(&reloaded);
    }

    Ok(())
}

#[test]
fn object_graph_siblings() -> simple_storage::Result<()> {
    let storage = Storage::default();

    let mut buf = vec![];
    storage.write_to(&family(), &mut buf, CompressionType::None)?;

    let reloaded: Vec<PersonRef> = storage.read_from(&mut &buf[..], CompressionType::None)?;
    let me = reloaded.get(2).expect("should exist");

    let mother = me.borrow().mother.upgrade().expect("mother should be alive");
    let siblings = mother
        .borrow()
        .children
        .iter()
        .filter(|x| !Rc::ptr_eq(x, me))
        .map(|x| x.borrow().name.clone())
        .collect::<Vec<_>>();

    assert_eq!(siblings, ["Jenny Doe", "Jerome Doe"]);

    Ok(())
}

#[test]
fn object_graph_shared_arc() -> simple_storage::Result<()> {
    let storage = Storage::default();

    let shared = Arc::new(String::from("shared"));
    let other = Arc::new(String::from("shared"));
    let value = vec![shared.clone(), other, shared];

    let mut buf = vec![];
    storage.write_to(&value, &mut buf, CompressionType::Deflate)?;

    let reloaded: Vec<Arc<String>> = storage.read_from(&mut &buf[..], CompressionType::Deflate)?;
    let [a, b, c] = &reloaded[..] else {
        panic!("expected three items");
    };

    assert!(Arc::ptr_eq(a, c));
    assert!(!Arc::ptr_eq(a, b));
    assert_eq!(a, b);

    Ok(())
}

#[derive(Default)]
struct Node {
    value: u32,
    next: Option<Arc<Mutex<Node>>>,
}

impl Encode for Node {
    fn encode_into<W: std::io::Write>(
        &self,
        writer: &mut Encoder<'_, W>,
    ) -> Result<(), EncodeError> {
        self.value.encode_into(writer)?;
        self.next.encode_into(writer)
    }
}

impl Decode for Node {
    fn decode_from<R: std::io::Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        Ok(Self {
            value: Decode::decode_from(reader)?,
            next: Decode::decode_from(reader)?,
        })
    }
}

#[test]
fn object_graph_strong_cycle() -> simple_storage::Result<()> {
    let storage = Storage::default();

    let a = Arc::new(Mutex::new(Node {
        value: 1,
        next: None,
    }));
    let b = Arc::new(Mutex::new(Node {
        value: 2,
        next: Some(a.clone()),
    }));
    a.lock().expect("lock is poisoned").next = Some(b.clone());

    let mut buf = vec![];
    storage.write_to(&a, &mut buf, CompressionType::Gzip)?;

    // Break the cycle so the original graph is freed
    a.lock().expect("lock is poisoned").next = None;

    let reloaded: Arc<Mutex<Node>> = storage.read_from(&mut &buf[..], CompressionType::Gzip)?;

    let next = reloaded
        .lock()
        .expect("lock is poisoned")
        .next
        .clone()
        .expect("should have next");

    assert_eq!(2, next.lock().expect("lock is poisoned").value);

    let back = next
        .lock()
        .expect("lock is poisoned")
        .next
        .clone()
        .expect("should point back");
    assert!(Arc::ptr_eq(&back, &reloaded));
    assert_eq!(1, back.lock().expect("lock is poisoned").value);

    drop(back);
    reloaded.lock().expect("lock is poisoned").next = None;
    drop(next);

    assert_eq!(1, Arc::strong_count(&reloaded));

    Ok(())
}

struct Link {
    value: u32,
    next: Option<Rc<Link>>,
}

impl Encode for Link {
    fn encode_into<W: std::io::Write>(
        &self,
        writer: &mut Encoder<'_, W>,
    ) -> Result<(), EncodeError> {
        self.value.encode_into(writer)?;
        self.next.encode_into(writer)
    }
}

impl Decode for Link {
    fn decode_from<R: std::io::Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        Ok(Self {
            value: Decode::decode_from(reader)?,
            next: Decode::decode_from(reader)?,
        })
    }
}

// NOTE: Nesting depth is bounded by the stack, a few hundred levels are fine
#[test]
fn object_graph_linked_list() -> simple_storage::Result<()> {
    const LEN: u32 = 200;

    let storage = Storage::default();

    let mut head = None;
    for value in (0..LEN).rev() {
        head = Some(Rc::new(Link { value, next: head }));
    }

    let mut buf = vec![];
    storage.write_to(&head, &mut buf, CompressionType::Deflate)?;

    let reloaded: Option<Rc<Link>> = storage.read_from(&mut &buf[..], CompressionType::Deflate)?;

    let mut expected = 0;
    let mut cursor = reloaded.as_deref();
    while let Some(link) = cursor {
        assert_eq!(expected, link.value);
        expected += 1;
        cursor = link.next.as_deref();
    }
    assert_eq!(LEN, expected);

    Ok(())
}
