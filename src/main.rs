use rand::Rng;
use simple_storage::{
    CompressionType, Decode, DecodeError, Decoder, Encode, EncodeError, Encoder, Save, Storage,
};
use std::{
    cell::RefCell,
    io::{Read, Write},
    rc::{Rc, Weak},
};

type PersonRef = Rc<RefCell<Person>>;

#[derive(Default)]
struct Person {
    name: String,
    age: i32,
    children: Vec<PersonRef>,
    mother: Weak<RefCell<Person>>,
    father: Weak<RefCell<Person>>,
}

impl Person {
    fn new(name: &str, age: i32) -> PersonRef {
        Rc::new(RefCell::new(Self {
            name: name.into(),
            age,
            ..Default::default()
        }))
    }

    fn siblings(&self) -> Vec<PersonRef> {
        let mut siblings: Vec<PersonRef> = vec![];

        for parent in [&self.mother, &self.father] {
            let Some(parent) = parent.upgrade() else {
                continue;
            };

            for child in &parent.borrow().children {
                if !siblings.iter().any(|x| Rc::ptr_eq(x, child)) {
                    siblings.push(child.clone());
                }
            }
        }

        siblings
    }
}

impl std::fmt::Display for Person {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.age)
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

fn describe(parent: &Weak<RefCell<Person>>) -> String {
    parent
        .upgrade()
        .map_or_else(|| "Unknown".into(), |p| p.borrow().to_string())
}

fn dump(person: &Person) {
    println!("Person");
    println!("\tName: {}", person.name);
    println!("\tAge: {}", person.age);
    println!("\tMother: {}", describe(&person.mother));
    println!("\tFather: {}", describe(&person.father));

    println!("\tChildren:");
    for child in &person.children {
        println!("\t\t{}", child.borrow());
    }

    println!("\tSiblings:");
    for sibling in person.siblings() {
        println!("\t\t{}", sibling.borrow());
    }
}

fn person_test(storage: &Storage) -> simple_storage::Result<()> {
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

    print!("Original ");
    dump(&me.borrow());

    let family = vec![dad, mom, me, sister, brother];
    family.save(storage, "people.data", CompressionType::Gzip)?;

    let reloaded: Vec<PersonRef> = storage.read("people.data", CompressionType::Gzip)?;

    if let Some(me) = reloaded.get(2) {
        print!("Reloaded ");
        dump(&me.borrow());
    }

    Ok(())
}

fn main() -> simple_storage::Result<()> {
    env_logger::init();

    let storage = Storage::default();

    person_test(&storage)?;

    let mut rng = rand::thread_rng();
    let numbers: Vec<i64> = (0..4_096 * 1_024)
        .map(|_| i64::from(rng.gen_range(0..i32::MAX)))
        .collect();

    numbers.save(&storage, "numbers.data", CompressionType::Deflate)?;
    let reloaded: Vec<i64> = storage.read("numbers.data", CompressionType::Deflate)?;

    println!(
        "Numbers = {}",
        if numbers == reloaded {
            "equal"
        } else {
            "not equal"
        }
    );

    Ok(())
}
