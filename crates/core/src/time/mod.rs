pub mod nba_calendar;
