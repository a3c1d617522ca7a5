// Copyright (c) 2024-present, simple-storage contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use simple_storage::{Decode, DecodeError, Decoder, Encode, EncodeError, Encoder};
use std::{
    cell::RefCell,
    io::{Read, Write},
    rc::{Rc, Weak},
};

pub type PersonRef = Rc<RefCell<Person>>;

/// Family member, children are owned, parents are not
#[derive(Debug, Default)]
pub struct Person {
    pub name: String,
    pub age: i32,
    pub children: Vec<PersonRef>,
    pub mother: Weak<RefCell<Person>>,
    pub father: Weak<RefCell<Person>>,
}

impl Person {
    pub fn new(name: &str, age: i32) -> PersonRef {
        Rc::new(RefCell::new(Self {
            name: name.into(),
            age,
            ..Default::default()
        }))
    }
}

impl Encode for Person {
    fn encode_into<W: Write>(&self, writer: &mut Encoder<'_, W>) -> Result<(), EncodeError> {
        self.name.encode_into(writer)?;
        self.age.encode_into(writer)?;
        self.children.encode_into(writer)?;
        self.mother.encode_into(writer)?;
        self.father.encode_into(writer)?;
        Ok(())
    }
}

impl Decode for Person {
    fn decode_from<R: Read>(reader: &mut Decoder<R>) -> Result<Self, DecodeError> {
        Ok(Self {
            name: Decode::decode_from(reader)?,
            age: Decode::decode_from(reader)?,
            children: Decode::decode_from(reader)?,
            mother: Decode::decode_from(reader)?,
            father: Decode::decode_from(reader)?,
        })
    }
}

/// Builds [dad, mom, me, sister, brother]
#[allow(unused)]
pub fn family() -> Vec<PersonRef> {
    let dad = Person::new("John Doe", 52);
    let mom = Person::new("Jane Doe", 48);
    let me = Person::new("Johnny Doe", 23);
    let sister = Person::new("Jenny Doe", 26);
    let brother = Person::new("Jerome Doe", 19);

    for child in [&me, &sister, &brother] {
        child.borrow_mut().mother = Rc::downgrade(&mom);
        child.borrow_mut().father = Rc::downgrade(&dad);
        dad.borrow_mut().children.push(child.clone());
        mom.borrow_mut().children.push(child.clone());
    }

    vec![dad, mom, me, sister, brother]
}

/// Checks that `family` is linked the way [`family`] links it
#[allow(unused)]
pub fn assert_family(family: &[PersonRef]) {
    let [dad, mom, me, sister, brother] = family else {
        panic!("family should have five members, got {}", family.len());
    };

    assert_eq!("John Doe", dad.borrow().name);
    assert_eq!(52, dad.borrow().age);
    assert_eq!("Jane Doe", mom.borrow().name);
    assert_eq!("Johnny Doe", me.borrow().name);
    assert_eq!(23, me.borrow().age);
    assert_eq!("Jenny Doe", sister.borrow().name);
    assert_eq!("Jerome Doe", brother.borrow().name);

    for parent in [dad, mom] {
        let parent = parent.borrow();
        assert_eq!(3, parent.children.len());

        for (child, expected) in parent.children.iter().zip([me, sister, brother]) {
            assert!(Rc::ptr_eq(child, expected));
        }
    }

    for child in [me, sister, brother] {
        let child = child.borrow();

        let mother = child.mother.upgrade().expect("mother should be alive");
        let father = child.father.upgrade().expect("father should be alive");

        assert!(Rc::ptr_eq(&mother, mom));
        assert!(Rc::ptr_eq(&father, dad));
    }
}

/// Random integers that fit in 31 bits, like a typical counter column
#[allow(unused)]
pub fn numbers(count: usize) -> Vec<i64> {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| i64::from(rng.gen_range(0..i32::MAX)))
        .collect()
}
