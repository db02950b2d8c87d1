use books_core::db::schema::CREATE_BOOKS_TABLE_SQL;
use books_core::{
    books_columns, create_books_table, open_db_in_memory, Book, BookId, BookRepository, DbError,
    Money, NewBook, RepoError, SqliteBookRepository, BOOKS_COLUMNS,
};
use rusqlite::Connection;

fn full_book(title: &str, upc: &str) -> NewBook {
    NewBook {
        title: title.to_string(),
        price: Some(Money::from_minor_units(5177)),
        rating: Some(3),
        availability: Some(22),
        upc: Some(upc.to_string()),
        product_type: Some("Books".to_string()),
        price_excl_tax: Some(Money::from_minor_units(5177)),
        price_incl_tax: Some(Money::from_minor_units(5177)),
        tax: Some(Money::ZERO),
        num_reviews: Some(0),
        description: Some("It's hard to imagine a world without A Light in the Attic.".to_string()),
    }
}

#[test]
fn books_table_has_exactly_the_declared_columns() {
    let conn = open_db_in_memory().unwrap();
    let columns = books_columns(&conn).unwrap();

    let expected = [
        ("Id", "INTEGER", true),
        ("Title", "VARCHAR(255)", true),
        ("Price", "DECIMAL(10,2)", false),
        ("Rating", "INTEGER", false),
        ("Availability", "INTEGER", false),
        ("UPC", "VARCHAR(50)", false),
        ("ProductType", "VARCHAR(100)", false),
        ("PriceExclTax", "DECIMAL(10,2)", false),
        ("PriceInclTax", "DECIMAL(10,2)", false),
        ("Tax", "DECIMAL(10,2)", false),
        ("NumReviews", "INTEGER", false),
        ("Description", "TEXT", false),
    ];
    assert_eq!(columns.len(), expected.len());
    assert_eq!(columns.len(), BOOKS_COLUMNS.len());

    for (column, (name, declared_type, required)) in columns.iter().zip(expected) {
        assert_eq!(column.name, name);
        assert_eq!(column.declared_type, declared_type, "type of {name}");
        assert_eq!(column.is_required(), required, "nullability of {name}");
    }
    assert!(columns[0].primary_key);
    assert!(columns.iter().skip(1).all(|column| !column.primary_key));
}

#[test]
fn ids_start_at_one_and_increment_by_one() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let first = repo.insert_book(&NewBook::new("first")).unwrap();
    let second = repo.insert_book(&NewBook::new("second")).unwrap();

    assert_eq!(first, BookId(1));
    assert_eq!(second.get(), first.get() + 1);
}

#[test]
fn null_title_is_rejected_by_the_store() {
    let conn = open_db_in_memory().unwrap();

    let raw = conn
        .execute("INSERT INTO Books (Title, UPC) VALUES (NULL, 'x');", [])
        .unwrap_err();
    let err = RepoError::from(raw);
    assert!(
        matches!(err, RepoError::ConstraintViolation(ref message) if message.contains("Books.Title")),
        "unexpected error: {err}"
    );

    let repo = SqliteBookRepository::try_new(&conn).unwrap();
    assert_eq!(repo.count_books().unwrap(), 0);
}

#[test]
fn title_only_row_stores_nulls_everywhere_else() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let id = repo.insert_book(&NewBook::new("Sapiens")).unwrap();
    let stored = repo.get_book(id).unwrap().unwrap();
    assert_eq!(stored, Book::with_id(id, NewBook::new("Sapiens")));

    let null_columns: i64 = conn
        .query_row(
            "SELECT (Price IS NULL) + (Rating IS NULL) + (Availability IS NULL)
                  + (UPC IS NULL) + (ProductType IS NULL) + (PriceExclTax IS NULL)
                  + (PriceInclTax IS NULL) + (Tax IS NULL) + (NumReviews IS NULL)
                  + (Description IS NULL)
             FROM Books WHERE Id = ?1;",
            [id.get()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(null_columns, 10);
}

#[test]
fn select_all_returns_every_inserted_row_with_all_columns() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let inserted = vec![
        full_book("A Light in the Attic", "a897fe39b1053632"),
        full_book("Tipping the Velvet", "90fa61229261140a"),
        NewBook::new("Soumission"),
    ];
    let mut expected = Vec::new();
    for book in &inserted {
        let id = repo.insert_book(book).unwrap();
        expected.push(Book::with_id(id, book.clone()));
    }

    let mut listed = repo.list_all_books().unwrap();
    listed.sort_by_key(|book| book.id);
    assert_eq!(listed, expected);

    let stmt = conn.prepare("SELECT * FROM Books").unwrap();
    assert_eq!(stmt.column_count(), 12);
    assert_eq!(stmt.column_names(), BOOKS_COLUMNS);
}

#[test]
fn rerunning_create_table_fails_with_table_exists() {
    let conn = open_db_in_memory().unwrap();

    let err = create_books_table(&conn).unwrap_err();
    assert!(matches!(err, DbError::TableAlreadyExists { ref table } if table == "Books"));

    let raw = conn.execute_batch(CREATE_BOOKS_TABLE_SQL).unwrap_err();
    assert!(raw.to_string().contains("already exists"));
}

#[test]
fn create_table_on_fresh_connection_then_query_all() {
    let conn = Connection::open_in_memory().unwrap();
    create_books_table(&conn).unwrap();

    let repo = SqliteBookRepository::try_new(&conn).unwrap();
    assert!(repo.list_all_books().unwrap().is_empty());
}

#[test]
fn duplicate_upc_values_are_accepted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let first = repo
        .insert_book(&full_book("Original", "a897fe39b1053632"))
        .unwrap();
    let second = repo
        .insert_book(&full_book("Reprint", "a897fe39b1053632"))
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(repo.count_books().unwrap(), 2);
}

#[test]
fn unconstrained_numeric_columns_accept_any_value() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let mut book = NewBook::new("Out of range");
    book.rating = Some(42);
    book.availability = Some(-1);
    book.num_reviews = Some(-7);
    let id = repo.insert_book(&book).unwrap();

    let stored = repo.get_book(id).unwrap().unwrap();
    assert_eq!(stored.rating, Some(42));
    assert_eq!(stored.availability, Some(-1));
    assert_eq!(stored.num_reviews, Some(-7));
}

#[test]
fn whole_number_prices_read_back_exactly() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let mut book = NewBook::new("Round price");
    book.price = Some(Money::from_minor_units(2000));
    book.tax = Some(Money::from_minor_units(1));
    let id = repo.insert_book(&book).unwrap();

    let stored = repo.get_book(id).unwrap().unwrap();
    assert_eq!(stored.price, Some(Money::from_minor_units(2000)));
    assert_eq!(stored.tax, Some(Money::from_minor_units(1)));
}
