use chrono::NaiveDate;
use modes_locations::error::DateError;
use modes_locations::model::{PartialDate, RecordDate};

fn date(raw: &str) -> PartialDate {
    raw.parse().expect("date parsed")
}

#[test]
fn modes_dates_parse_at_three_granularities() {
    assert_eq!(
        date("1.6.2023"),
        PartialDate {
            year: 2023,
            month: Some(6),
            day: Some(1)
        }
    );
    assert_eq!(
        date("6.2023"),
        PartialDate {
            year: 2023,
            month: Some(6),
            day: None
        }
    );
    assert_eq!(date("2023"), PartialDate::year(2023));
}

#[test]
fn dates_display_without_leading_zeros() {
    assert_eq!(date("01.06.2023").to_string(), "1.6.2023");
    assert_eq!(date("06.2023").to_string(), "6.2023");
    assert_eq!(date(" 2023 ").to_string(), "2023");
}

#[test]
fn malformed_dates_are_rejected() {
    assert_eq!("".parse::<PartialDate>(), Err(DateError::Empty));
    assert!(matches!(
        "1.13.2020".parse::<PartialDate>(),
        Err(DateError::OutOfRange(_))
    ));
    assert!(matches!(
        "30.2.2020".parse::<PartialDate>(),
        Err(DateError::OutOfRange(_))
    ));
    assert!(matches!(
        "a.1.2020".parse::<PartialDate>(),
        Err(DateError::NotNumeric(_))
    ));
    assert!(matches!(
        "2020-01-01".parse::<PartialDate>(),
        Err(DateError::NotNumeric(_))
    ));
    assert!(matches!(
        "1.1.1.2020".parse::<PartialDate>(),
        Err(DateError::BadFieldCount(_))
    ));
}

#[test]
fn coarser_dates_sort_first_within_their_period() {
    assert!(date("2020") < date("1.2020"));
    assert!(date("1.2020") < date("1.1.2020"));
    assert!(date("1.1.2020") < date("2.1.2020"));
    assert!(date("31.12.2019") < date("2020"));
    assert_ne!(date("2020"), date("1.1.2020"));
}

#[test]
fn record_dates_keep_unparseable_text() {
    assert_eq!(
        RecordDate::parse("1.1.2020"),
        RecordDate::Valid(date("1.1.2020"))
    );
    let invalid = RecordDate::parse("spring 2020");
    assert_eq!(invalid, RecordDate::Invalid("spring 2020".to_string()));
    assert_eq!(invalid.to_string(), "spring 2020");
    assert_eq!(invalid.valid(), None);
}

#[test]
fn calendar_dates_convert_only_within_the_modes_year_range() {
    let midsummer = NaiveDate::from_ymd_opt(2023, 6, 21).expect("calendar date");
    assert_eq!(PartialDate::try_from(midsummer), Ok(date("21.6.2023")));

    let ancient = NaiveDate::from_ymd_opt(-44, 3, 15).expect("calendar date");
    assert!(matches!(
        PartialDate::try_from(ancient),
        Err(DateError::OutOfRange(_))
    ));
}
