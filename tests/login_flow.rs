//! Integration tests for login, character creation and session takeover.

mod common;

use common::{PASSWORD, TestServer};

#[tokio::test]
async fn new_character_enters_the_world() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    let mut client = server.connect().await.expect("Failed to connect");

    client.send_line("aria").await.unwrap();
    client
        .expect("No adventurer with that name exists.  Create Aria? [y/N] ")
        .await
        .unwrap();
    client.send_line("yes").await.unwrap();
    client
        .expect("Creating new character Aria.\r\nPlease choose a password: ")
        .await
        .unwrap();
    client.send_line(PASSWORD).await.unwrap();
    client.expect("Please confirm your password: ").await.unwrap();
    client.send_line("different").await.unwrap();
    client
        .expect("Passwords didn't match.\r\nPlease choose a password: ")
        .await
        .unwrap();
    client.send_line(PASSWORD).await.unwrap();
    client.expect("Please confirm your password: ").await.unwrap();
    client.send_line(PASSWORD).await.unwrap();

    let races = client.expect("Choice: ").await.unwrap();
    assert!(races.contains("Please choose a race from the following options:\r\n"));
    assert!(races.contains("human        elf          dwarf        ogre"));

    client.send_line("gnome").await.unwrap();
    client
        .expect("Invalid choice for race, please choose another: ")
        .await
        .unwrap();
    client.send_line("Elf").await.unwrap();
    client
        .expect("Are you sure you want to be a elf? [y/N] ")
        .await
        .unwrap();
    client.send_line("y").await.unwrap();

    let classes = client.expect("Choice: ").await.unwrap();
    assert!(classes.contains("warrior"));
    assert!(!classes.contains("none"));
    client.send_line("mage").await.unwrap();
    client.expect("[y/N] ").await.unwrap();
    client.send_line("y").await.unwrap();
    client.expect("[ Press return to continue ]").await.unwrap();
    client.send_line("").await.unwrap();

    let entered = client.expect("\r\n> ").await.unwrap();
    assert!(entered.contains("You have entered the world of Testland."));
    assert!(entered.contains("Town Square"));

    client.send_line("score").await.unwrap();
    let score = client.expect("\r\n> ").await.unwrap();
    assert!(score.contains("You are Aria, a level 1 elf mage."), "got {score:?}");

    client.send_line("dance").await.unwrap();
    client
        .expect("Alas, there is no such command: dance.")
        .await
        .unwrap();
}

#[tokio::test]
async fn returning_character_logs_in_with_password() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    let mut first = server.connect().await.expect("Failed to connect");
    first.create_character("bran", PASSWORD).await.unwrap();
    first.send_line("quit").await.unwrap();
    first.expect_closed().await.unwrap();

    let mut client = server.connect().await.expect("Failed to connect");
    client.send_line("Bran").await.unwrap();
    client.expect("Password: ").await.unwrap();
    client.send_line("wrong").await.unwrap();
    client
        .expect("Wrong password.\r\n\r\nBy what name do you wish to be known? ")
        .await
        .unwrap();

    client.send_line("bran").await.unwrap();
    client.expect("Password: ").await.unwrap();
    client.send_line(PASSWORD).await.unwrap();
    client.expect("[ Press return to continue ]").await.unwrap();
    client.send_line("").await.unwrap();
    let entered = client.expect("\r\n> ").await.unwrap();
    assert!(entered.contains("You have entered the world of Testland."));
}

#[tokio::test]
async fn second_login_takes_over_the_session() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    let mut a = server.connect().await.expect("Failed to connect");
    a.create_character("cora", PASSWORD).await.unwrap();

    let mut observer = server.connect().await.expect("Failed to connect");
    observer.create_character("dell", PASSWORD).await.unwrap();
    a.expect("Dell has entered the game.").await.unwrap();

    let mut b = server.connect().await.expect("Failed to connect");
    b.send_line("cora").await.unwrap();
    b.expect("Password: ").await.unwrap();
    b.send_line(PASSWORD).await.unwrap();
    let resumed = b.expect("\r\n> ").await.unwrap();
    assert!(resumed.contains("Reconnecting to a session in progress."));
    assert!(!resumed.contains("Please choose a race"));

    let last = a.expect_closed().await.unwrap();
    assert!(last.contains("This character has been claimed by another connection."));

    let seen = observer.expect("\r\n> ").await.unwrap();
    assert_eq!(seen.matches("Cora has reconnected.").count(), 1, "got {seen:?}");

    b.send_line("say still here").await.unwrap();
    observer.expect("Cora says, 'still here'").await.unwrap();
}

#[tokio::test]
async fn name_in_use_during_login_is_refused() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    let mut a = server.connect().await.expect("Failed to connect");
    let mut b = server.connect().await.expect("Failed to connect");

    a.send_line("eryn").await.unwrap();
    a.expect("Create Eryn? [y/N] ").await.unwrap();

    b.send_line("ERYN").await.unwrap();
    b.expect("That name is already in use, please try another.\r\n\r\nBy what name do you wish to be known? ")
        .await
        .unwrap();

    // Declining releases the name.
    a.send_line("n").await.unwrap();
    a.expect("By what name do you wish to be known? ").await.unwrap();
    b.send_line("eryn").await.unwrap();
    b.expect("Create Eryn? [y/N] ").await.unwrap();
}
